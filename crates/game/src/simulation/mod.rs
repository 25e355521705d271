mod driver;
mod input;
mod tick;
mod time;

pub use driver::{ClientError, ClientLoop, ExitReason, Frontend, LoopConfig, World};
pub use input::{Buttons, InputSample};
pub use tick::{FixedTimestep, DEFAULT_MAX_FRAMESKIP, DEFAULT_TICK_RATE};
pub use time::{Clock, ManualClock, SystemClock};
