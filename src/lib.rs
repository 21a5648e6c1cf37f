#[cfg(test)]
mod test;

pub mod api;
mod bloom;
mod build;
mod engine;
mod error;
mod hash;
mod key;
mod multi;
mod v0;
mod v1;

pub use {
    api::{
        build_bytes,
        build_multi,
        build_multi_bytes,
        build_numeric,
        build_string,
        build_v1,
        build_v1_strings,
        get_multi,
        get_multi_bytes,
        get_v0_bytes,
        get_v0_numeric,
        get_v0_string,
        get_v1,
    },
    error::Error,
    hash::{Hash, Sha512},
    multi::MultiFilter,
    v0::FilterV0,
    v1::FilterV1,
};
