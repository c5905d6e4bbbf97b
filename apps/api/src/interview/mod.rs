// Interview Session Engine
// Owns session identity, question order, answer submission and the move to an
// evaluated report. Question generation and answer scoring are external
// capabilities behind traits; durable storage is a fire-and-forget side channel.

pub mod answer_evaluator;
pub mod controller;
pub mod error;
pub mod handlers;
pub mod models;
pub mod persistence;
pub mod prompts;
pub mod question_generator;
pub mod report;
pub mod sequencer;
pub mod store;
pub mod submission;

#[cfg(test)]
pub mod testing;
