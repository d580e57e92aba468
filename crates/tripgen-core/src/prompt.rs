//! Prompt construction for itinerary generation.

use crate::types::TripRequest;
use std::fmt;

/// Text sent to the generation service. Built once per request, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompt(String);

impl GenerationPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenerationPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the generation prompt for a trip request.
///
/// Pure and deterministic. Field values are interpolated as-is; empty
/// strings produce empty slots rather than an error.
pub fn build_prompt(req: &TripRequest) -> GenerationPrompt {
    let text = format!(
        "Create a {style} itinerary for {destination}\n\
         from {start} to {end}.\n\
         Travelers: {travelers}\n\
         Budget: {budget}\n\
         Pace: {pace}\n\
         Starting City: {starting_city}\n\
         Surprise: {surprise}\n\
         \n\
         Return ONLY a JSON itinerary. Do not include any prose, explanation or markdown outside the JSON.\n",
        style = req.travel_style,
        destination = req.destination,
        start = req.start_date,
        end = req.end_date,
        travelers = req.travelers,
        budget = req.budget,
        pace = req.pace,
        starting_city = req.starting_city,
        surprise = req.surprise_me,
    );
    GenerationPrompt(text)
}
