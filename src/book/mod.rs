//! Book records and their byte representations
//!
//! A book is metadata plus up to two routes back to its bytes: a
//! process-local ephemeral handle and a self-contained durable encoding.

mod encoding;
mod record;

pub use encoding::{
    decode_durable, encode_durable, resolve_durable, HandleRegistry, ViewSource, DATA_URL_PREFIX,
};
pub use record::BookRecord;
