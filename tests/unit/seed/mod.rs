pub mod conversions;
pub mod end_to_end;
pub mod indels;
pub mod word_hash;
