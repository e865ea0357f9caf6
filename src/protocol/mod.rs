//! Command Protocol Module
//!
//! Message vocabulary shared by every participant and the decoder that
//! pulls records out of an unframed byte stream.

mod codec;
mod command;

pub use codec::{CommandDecoder, MAX_PENDING_BYTES};
pub use command::{Adjustment, Command, ParamKind};
