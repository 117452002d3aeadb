pub mod controller;
pub mod controls;
pub mod protocol;
pub mod series;

pub use controller::{Alert, Applied, CommandSink, DashboardController, SendError};
pub use controls::{ControlState, RunState};
pub use protocol::{
    decode_inbound, Command, Inbound, ProtocolError, ServerMsg, DEFAULT_ENDPOINT, DEFAULT_PORT,
    SUBPROTOCOL,
};
pub use series::{Point, SeriesBuffer};
