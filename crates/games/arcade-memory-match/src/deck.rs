use rand::Rng;
use serde::{Deserialize, Serialize};

/// Card faces, in the order they are handed out per difficulty.
pub const CARD_FACES: [&str; 24] = [
    "🍎", "🍌", "🍒", "🍓", "🍕", "🍩", "🍪", "🌮", "🦊", "🐶", "🐱", "🐼", "🐨", "🐯", "🦁", "🐮",
    "🚗", "🚕", "🚙", "🚌", "🚎", "🏎️", "🚓", "🚑",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardState {
    FaceDown,
    FaceUp,
    Matched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub face: String,
    pub state: CardState,
}

/// Fisher–Yates shuffle: walk from the last index down to 1, swapping each
/// slot with a uniformly chosen index in `[0, i]`.
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Deal `pairs` distinct faces, each twice, shuffled and face down.
/// `pairs` is capped at the number of available faces.
pub fn deal<R: Rng>(pairs: usize, rng: &mut R) -> Vec<Card> {
    let faces = &CARD_FACES[..pairs.min(CARD_FACES.len())];
    let mut deck: Vec<&str> = faces.iter().chain(faces.iter()).copied().collect();
    shuffle(&mut deck, rng);
    deck.into_iter()
        .map(|face| Card {
            face: face.to_string(),
            state: CardState::FaceDown,
        })
        .collect()
}
