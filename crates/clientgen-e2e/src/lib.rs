//! Clients rendered at build time from the generator's test documents.
//!
//! `setup` comes from `setup.json`, `shop` from `items.yaml`. The tests run
//! them against local stub servers.

include!(concat!(env!("OUT_DIR"), "/clients.rs"));
