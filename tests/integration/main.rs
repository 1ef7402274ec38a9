//! End-to-end tests of the auth core wired through [`shopfront_auth::AuthContext`].

mod auth_test;
mod helpers;
mod role_test;
mod token_test;
