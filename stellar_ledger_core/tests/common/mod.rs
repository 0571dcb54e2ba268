// Each test binary uses a different subset of the fakes.
#![allow(dead_code)]

pub mod fake_device;
