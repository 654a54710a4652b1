pub mod analyzer; // symptom analysis via the chat model
pub mod api; // HTTP surface
pub mod booking; // appointment confirmation against the mock platform
pub mod config;
pub mod db;
pub mod directory; // mock hospital/slot data
pub mod guidance; // static visit-flow walkthroughs
pub mod llm; // chat-completions client
pub mod medication; // medication guide
pub mod models;
pub mod schedule; // dose bucketing + reminder expansion
pub mod triage; // model-reply classification
