mod log;
mod program;

pub use log::{AuctionLog, SilentLog, TraceLog};
pub use program::{Direction, LinExpr, MathProgram, ProgramError, Sense, Variable};
