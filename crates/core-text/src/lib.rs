//! Text primitives of the line editor: the editable line and the quote tracker.

pub mod line;
pub mod quote;
pub mod width;

pub use line::LineBuffer;
pub use quote::{Emit, Quote, QuoteState, QuoteTracker, transition};
pub use width::{cp_width, cps_width};
