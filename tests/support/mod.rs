// Not every test binary exercises every fixture.
#![allow(dead_code)]

pub mod catalog;
