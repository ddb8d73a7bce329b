//! Request middleware for the register's web surface.

pub mod audit;
