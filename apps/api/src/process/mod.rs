// Interview process tracking.
// CRUD over processes, their stages (rounds), and their followup tasks.

pub mod handlers;
