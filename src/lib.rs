pub mod card;
pub mod city;
pub mod color;
pub mod config;
pub mod error;
pub mod game_phase;
mod game_state;
pub mod manager;
pub mod map;
pub mod moves;
pub mod participant;
pub mod player;
pub mod referee;
pub mod score;
pub mod strategy;

#[macro_use]
extern crate lazy_static;
