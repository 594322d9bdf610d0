// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer (credential file).

pub mod token_store;

pub use token_store::TokenStore;
