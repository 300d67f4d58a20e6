pub mod backend;
pub mod config;
pub mod error;
pub mod gpio;
pub mod layout;

pub use backend::{AccessMode, FileBackend, FileHandle, MockFsBackend, StdFsBackend};
pub use config::{Direction, Edge, GpioConfig, LogicLevel, PinConfig, Value};
pub use error::GpioError;
pub use gpio::{Pin, PinController};
pub use layout::{PinAttr, SysfsLayout, SysfsNode};
