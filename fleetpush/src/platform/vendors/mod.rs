//! Built-in platform definitions.

pub mod cisco_ios;
pub mod generic;
pub mod huawei_vrp;
