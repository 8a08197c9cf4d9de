//! Exercise name → muscle-group category.
//!
//! Keyword matching over the normalized exercise name. Rules are checked in
//! order, so compound lifts are caught before the single-muscle rules that
//! would otherwise claim them ("romanian deadlift" is legs, not back). Leg
//! lifts precede cardio so "walking lunge" stays legs, and cardio precedes
//! back so "rowing" is not a row.

use super::types::{normalize_exercise, Category};

const RULES: &[(Category, &[&str])] = &[
    (
        Category::FullBody,
        &["burpee", "clean", "snatch", "thruster", "crossfit", "kettlebell swing", "turkish get"],
    ),
    (
        Category::Legs,
        &[
            "squat", "lunge", "leg press", "leg curl", "leg extension", "calf", "romanian",
            "rdl", "hip thrust", "glute", "step up", "hamstring", "quad",
        ],
    ),
    (
        Category::Cardio,
        &[
            "run", "jog", "sprint", "cycl", "bike", "row machine", "rowing", "swim", "elliptical",
            "stair", "walk", "hike", "jump rope", "skipping", "treadmill", "cardio",
        ],
    ),
    (
        Category::Chest,
        &["bench", "chest", "push up", "pushup", "push-up", "pec", "fly", "flye", "dip"],
    ),
    (
        Category::Back,
        &["deadlift", "row", "pull up", "pullup", "pull-up", "chin up", "chinup", "lat ", "lats", "pulldown", "shrug", "back extension"],
    ),
    (
        Category::Shoulders,
        &["overhead press", "shoulder", "military press", "lateral raise", "front raise", "face pull", "arnold", "ohp"],
    ),
    (
        Category::Arms,
        &["curl", "tricep", "bicep", "skull crusher", "hammer", "forearm", "wrist"],
    ),
    (
        Category::Core,
        &["plank", "crunch", "sit up", "situp", "sit-up", "ab ", "abs", "russian twist", "leg raise", "core", "oblique", "hollow"],
    ),
];

/// Derive the category tag for an exercise. Unknown exercises map to [`Category::Other`].
pub fn derive_category(exercise: &str) -> Category {
    // keywords anchor at a word start; the trailing pad lets "lat " match at the end
    let name = format!(" {} ", normalize_exercise(exercise));
    RULES
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|k| name.contains(&format!(" {k}")))
        })
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}
