use super::dto::{Card, CardList, SearchFilter};

/// Case-insensitive substring match on the card name or its oracle text.
pub fn matches(card: &Card, term: &str, filter: SearchFilter) -> bool {
    let needle = term.to_lowercase();
    match filter {
        SearchFilter::Name => card.name.to_lowercase().contains(&needle),
        SearchFilter::Ability => card.full_oracle_text().to_lowercase().contains(&needle),
    }
}

/// Keeps matching cards; `total_cards` then counts what is returned.
pub fn retain_matches(list: CardList, term: &str, filter: SearchFilter) -> CardList {
    let data: Vec<Card> = list
        .data
        .into_iter()
        .filter(|card| matches(card, term, filter))
        .collect();
    CardList {
        total_cards: data.len() as u64,
        has_more: list.has_more,
        data,
    }
}
