// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Request handlers

pub mod auth;
pub mod content;
pub mod health;
pub mod openapi;
pub mod site;
pub mod skills;
pub mod users;
