mod engine;
mod rest;

pub use engine::TimerEngine;
