mod common;

mod lottery;
