mod common;
pub mod header;
pub mod ness;
pub mod samples;
pub mod sub_header;

pub use header::{parse_header, parse_transmission_time, HEADER_SIZE};
pub use ness::{extract_block, unpack_block};
pub use samples::decode_samples;
pub use sub_header::{decode_sub_header, SUB_HEADER_LEN};
