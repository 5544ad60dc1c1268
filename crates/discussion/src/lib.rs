//! Comment tree logic which doesnt touch storage or the network: editing a tree held in
//! memory, flattening trees into rows for the research dashboard, the vote state machine,
//! and the export formats.

pub mod export;
pub mod flatten;
pub mod mutate;
pub mod responses;
pub mod voting;
