#![no_std]

pub mod time_wrapper;
