//! Ghost Core
//!
//! Foundational primitives shared by the Ghost playback crates:
//!
//! - **Geometry**: points and rectangles for target bounds and cursor positions
//! - **State Machines**: table-driven FSMs with typed states and events
//! - **Errors**: the playback error taxonomy
//!
//! # Example
//!
//! ```rust
//! use ghost_core::fsm::StateMachine;
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Door { Open, Closed }
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Push { Close, Open }
//!
//! let mut door = StateMachine::builder(Door::Open)
//!     .on(Door::Open, Push::Close, Door::Closed)
//!     .on(Door::Closed, Push::Open, Door::Open)
//!     .build();
//!
//! door.send(Push::Close);
//! assert_eq!(door.current_state(), Door::Closed);
//! ```

pub mod error;
pub mod fsm;
pub mod geometry;

pub use error::{GhostError, Result};
pub use fsm::{StateMachine, StateMachineBuilder, Transition};
pub use geometry::{Point, Rect, Size};
