use serde_json::json;
use studio_core::{
    Collection, DbSymbol, DirtyKey, LanguageConfig, SaveIntent, SelectedIdentifier, TextTable,
};
use studio_engine::{Direction, EngineError, NavigationOrder};
use studio_harness::TestProject;
use studio_harness::fixtures::{ball, physical_move, with};

fn sym(s: &str) -> DbSymbol {
    DbSymbol::new(s).unwrap()
}

async fn balls() -> Result<TestProject, Box<dyn std::error::Error>> {
    let project = TestProject::new()?;
    project.seed(Collection::Items, ball("poke_ball", 1))?;
    project.seed(Collection::Items, ball("great_ball", 2))?;
    Ok(project)
}

// ============================================================================
// Writes and the dirty set
// ============================================================================

#[tokio::test]
async fn writes_to_one_entity_leave_one_update() -> Result<(), Box<dyn std::error::Error>> {
    let project = balls().await?;
    let mut state = project.load().await?;

    let mut items = state.items();
    let ball = items.get("poke_ball").unwrap();
    for price in [250, 300, 400] {
        items.write(&sym("poke_ball"), ball.with_field("price", price), None);
    }

    assert_eq!(state.dirty().len(), 1);
    assert_eq!(
        state.dirty().get(&DirtyKey::new(Collection::Items, "poke_ball")),
        Some(SaveIntent::Update)
    );
    Ok(())
}

#[tokio::test]
async fn unchanged_write_never_marks() -> Result<(), Box<dyn std::error::Error>> {
    let project = balls().await?;
    let mut state = project.load().await?;
    let before = state.snapshot();

    let same = state.items().get("great_ball").unwrap();
    state
        .items()
        .write(&sym("great_ball"), same, Some(sym("great_ball").into()));

    let after = state.snapshot();
    assert!(after.dirty().is_empty());
    assert!(!after.shares_collection(&before, Collection::Items));
    assert_eq!(after.selected(Collection::Items), SelectedIdentifier::from(sym("great_ball")));
    Ok(())
}

// ============================================================================
// Removal
// ============================================================================

#[tokio::test]
async fn removing_the_replacement_itself_changes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let project = balls().await?;
    let mut state = project.load().await?;
    let before = state.snapshot();

    let result = state.items().remove(&sym("poke_ball"), sym("poke_ball").into());
    assert!(matches!(result, Err(EngineError::Precondition(_))));

    let after = state.snapshot();
    assert!(std::sync::Arc::ptr_eq(&before, &after));
    assert_eq!(after.collection(Collection::Items).len(), 2);
    assert!(after.dirty().is_empty());
    assert_eq!(after.selected(Collection::Items), SelectedIdentifier::from(sym("poke_ball")));
    Ok(())
}

#[tokio::test]
async fn remove_poke_ball_selects_great_ball() -> Result<(), Box<dyn std::error::Error>> {
    let project = balls().await?;
    let mut state = project.load().await?;

    let mut items = state.items();
    let ball = items.get("poke_ball").unwrap();
    items.write(&sym("poke_ball"), ball.with_field("price", 250), None);
    items.remove(&sym("poke_ball"), sym("great_ball").into())?;

    let entities = items.read();
    let keys: Vec<&str> = entities.keys().map(DbSymbol::as_str).collect();
    assert_eq!(keys, ["great_ball"]);
    assert_eq!(entities[&sym("great_ball")].id(), Some(2));
    assert_eq!(items.selected(), SelectedIdentifier::from(sym("great_ball")));

    let dirty: Vec<_> = state.dirty().iter().map(|(k, e)| (k.clone(), e.intent)).collect();
    assert_eq!(
        dirty,
        [(DirtyKey::new(Collection::Items, "poke_ball"), SaveIntent::Delete)]
    );
    Ok(())
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn numeric_navigation_wraps() -> Result<(), Box<dyn std::error::Error>> {
    let project = TestProject::new()?;
    for (symbol, id) in [("tackle", 1), ("growl", 5), ("bite", 10)] {
        project.seed(Collection::Moves, physical_move(symbol, id))?;
    }
    let mut state = project.load().await?;

    let mut moves = state.moves();
    assert_eq!(moves.selected(), SelectedIdentifier::from(sym("tackle")));
    moves.set_selected(sym("growl"));
    assert_eq!(moves.next(NavigationOrder::Id), sym("bite"));
    moves.set_selected(sym("bite"));
    assert_eq!(moves.next(NavigationOrder::Id), sym("tackle"));
    moves.set_selected(sym("tackle"));
    assert_eq!(moves.previous(NavigationOrder::Id), sym("bite"));
    Ok(())
}

#[tokio::test]
async fn lone_entity_is_its_own_neighbor() -> Result<(), Box<dyn std::error::Error>> {
    let project = TestProject::new()?;
    project.seed(Collection::Types, json!({"klass": "Type", "id": 1, "dbSymbol": "normal", "textId": 0}))?;
    let mut state = project.load().await?;

    let types = state.types();
    for order in [NavigationOrder::Id, NavigationOrder::Name] {
        for direction in [Direction::Previous, Direction::Next] {
            assert_eq!(types.adjacent(direction, order), sym("normal"));
        }
    }
    Ok(())
}

#[tokio::test]
async fn empty_collection_navigates_to_undefined() -> Result<(), Box<dyn std::error::Error>> {
    let project = TestProject::new()?;
    let mut state = project.load().await?;
    let quests = state.quests();
    assert!(quests.selected().db_symbol().is_undefined());
    assert!(quests.next(NavigationOrder::Id).is_undefined());
    assert!(quests.previous(NavigationOrder::Name).is_undefined());
    Ok(())
}

#[tokio::test]
async fn name_navigation_uses_project_texts() -> Result<(), Box<dyn std::error::Error>> {
    let project = TestProject::new()?;
    let mut names = TextTable::new(&["en", "fr"]);
    for (id, en, fr) in [(1, "Zubat", "Nosferapti"), (2, "Abra", "Abra"), (3, "Mew", "Mew")] {
        names.set(id, "en", en);
        names.set(id, "fr", fr);
    }
    project.seed_text(100_000, &names)?;
    project.seed_language(&LanguageConfig {
        default_language: "fr".into(),
        ..LanguageConfig::default()
    })?;
    for (symbol, id) in [("zubat", 1), ("abra", 2), ("mew", 3)] {
        project.seed(Collection::Pokemon, json!({"klass": "Specie", "id": id, "dbSymbol": symbol}))?;
    }
    let mut state = project.load().await?;

    let mut pokemon = state.pokemon();
    assert_eq!(
        pokemon.selected(),
        SelectedIdentifier::Species { specie: sym("zubat"), form: 0 }
    );
    // French order: Abra, Mew, Nosferapti.
    assert_eq!(pokemon.next(NavigationOrder::Name), sym("abra"));
    assert_eq!(pokemon.previous(NavigationOrder::Name), sym("mew"));

    let selected = pokemon.select_adjacent(Direction::Next, NavigationOrder::Name);
    assert_eq!(selected, SelectedIdentifier::Species { specie: sym("abra"), form: 0 });
    assert_eq!(pokemon.next(NavigationOrder::Name), sym("mew"));
    Ok(())
}

// ============================================================================
// Binding and loading
// ============================================================================

#[tokio::test]
async fn bound_entity_resolves_name_without_saving_it() -> Result<(), Box<dyn std::error::Error>> {
    let project = balls().await?;
    let mut names = TextTable::new(&["en"]);
    names.set(1, "en", "Poké Ball");
    project.seed_text(100_012, &names)?;
    let mut state = project.load().await?;

    let mut items = state.items();
    let bound = items.bind(items.get("poke_ball").unwrap());
    assert_eq!(bound.name(), "Poké Ball");
    items.write_bound(&sym("poke_ball"), bound, None)?;
    assert!(state.dirty().is_empty());

    Ok(())
}

#[tokio::test]
async fn missing_text_reports_its_coordinates() -> Result<(), Box<dyn std::error::Error>> {
    let project = balls().await?;
    let mut state = project.load().await?;
    let items = state.items();
    let bound = items.bind(items.get("great_ball").unwrap());
    assert_eq!(bound.name(), "[100012, 2] text not found");
    Ok(())
}

#[tokio::test]
async fn invalid_move_rejects_the_project() -> Result<(), Box<dyn std::error::Error>> {
    let project = TestProject::new()?;
    project.seed(
        Collection::Moves,
        with(physical_move("broken", 1), "pp", 500),
    )?;
    match project.load().await {
        Err(EngineError::Validation { collection, db_symbol, .. }) => {
            assert_eq!(collection, Collection::Moves);
            assert_eq!(db_symbol, "broken");
        }
        Err(other) => return Err(other.into()),
        Ok(_) => panic!("invalid move accepted"),
    }
    Ok(())
}

#[tokio::test]
async fn sqlite_backed_worker_serves_the_same_project() -> Result<(), Box<dyn std::error::Error>> {
    let project = TestProject::in_memory()?;
    project.seed(Collection::Zones, json!({"klass": "Zone", "id": 4, "dbSymbol": "route_1"}))?;
    project.seed(Collection::Zones, json!({"klass": "Zone", "id": 3, "dbSymbol": "pallet_town"}))?;
    let mut state = project.load().await?;
    assert_eq!(state.zones().selected(), SelectedIdentifier::from(sym("pallet_town")));
    assert_eq!(state.zones().read().len(), 2);
    Ok(())
}
