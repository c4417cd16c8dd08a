//! Interface layer exposing the tracker to clients.

pub mod rest;
