use agendablocks_core::{
    AgendaService, AgendaServiceError, Block, BlockKind, InMemoryContentStore,
};

fn service() -> AgendaService<InMemoryContentStore> {
    AgendaService::new(InMemoryContentStore::new())
}

fn seeded() -> (AgendaService<InMemoryContentStore>, String, String, String) {
    let mut svc = service();
    let planning = svc.create_section("Planning").unwrap();
    let budget = svc
        .create_item(BlockKind::Topic, Some(planning.clone()), "Budget")
        .unwrap();
    let hiring = svc
        .create_item(BlockKind::Objective, Some(planning.clone()), "Hiring")
        .unwrap();
    (svc, planning, budget, hiring)
}

#[test]
fn create_validates_titles_and_parents() {
    let mut svc = service();

    assert!(matches!(
        svc.create_section("   "),
        Err(AgendaServiceError::InvalidTitle)
    ));
    assert!(matches!(
        svc.create_item(BlockKind::Section, None, "Nope"),
        Err(AgendaServiceError::LeafKindRequired)
    ));
    assert!(matches!(
        svc.create_item(BlockKind::Topic, Some("ghost".to_string()), "Topic"),
        Err(AgendaServiceError::ParentNotFound(_))
    ));

    let section = svc.create_section("Planning").unwrap();
    let topic = svc
        .create_item(BlockKind::Topic, Some(section.clone()), "Budget")
        .unwrap();
    assert!(matches!(
        svc.create_item(BlockKind::Topic, Some(topic), "Nested"),
        Err(AgendaServiceError::ParentMustBeSection(_))
    ));
}

#[test]
fn created_blocks_carry_content_payloads() {
    let (svc, planning, budget, _) = seeded();

    assert_eq!(svc.content(&planning).unwrap().title, "Planning");
    assert_eq!(svc.content(&budget).unwrap().title, "Budget");

    let blocks = svc.blocks();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].id, planning);
    assert_eq!(blocks[1].id, budget);
}

#[test]
fn insert_item_places_among_siblings() {
    let (mut svc, planning, budget, _) = seeded();
    let urgent = svc
        .insert_item(BlockKind::ActionItem, Some(planning.clone()), 0, "Urgent")
        .unwrap();

    let tree = svc.tree();
    assert_eq!(tree.len(), 1);
    let child_ids: Vec<&str> = tree[0]
        .children
        .iter()
        .map(|node| node.block.id.as_str())
        .collect();
    assert_eq!(child_ids[0], urgent);
    assert_eq!(child_ids[1], budget);
}

#[test]
fn delete_removes_descendant_payloads() {
    let (mut svc, planning, budget, hiring) = seeded();

    svc.delete_block(&planning).unwrap();
    assert!(svc.blocks().is_empty());
    assert!(svc.content(&planning).is_none());
    assert!(svc.content(&budget).is_none());
    assert!(svc.content(&hiring).is_none());

    assert!(matches!(
        svc.delete_block(&planning),
        Err(AgendaServiceError::BlockNotFound(_))
    ));
}

#[test]
fn convert_migrates_payload_under_new_item_key() {
    let (mut svc, _, budget, _) = seeded();
    let old_item = svc
        .blocks()
        .iter()
        .find(|block| block.id == budget)
        .map(|block| block.item_id.clone())
        .unwrap();

    let new_item = svc.convert_item(&budget, BlockKind::ActionItem).unwrap();
    assert_ne!(new_item, old_item);

    let block = svc
        .blocks()
        .into_iter()
        .find(|block| block.id == budget)
        .unwrap();
    assert_eq!(block.kind, BlockKind::ActionItem);
    assert_eq!(block.item_id, new_item);
    assert_eq!(svc.content(&budget).unwrap().title, "Budget");
}

#[test]
fn convert_rejects_sections_and_unknown_blocks() {
    let (mut svc, planning, _, _) = seeded();

    assert!(matches!(
        svc.convert_item(&planning, BlockKind::Topic),
        Err(AgendaServiceError::LeafKindRequired)
    ));
    assert!(matches!(
        svc.convert_item("ghost", BlockKind::Topic),
        Err(AgendaServiceError::BlockNotFound(_))
    ));
}

#[test]
fn move_block_keeps_noop_semantics() {
    let (mut svc, _, budget, hiring) = seeded();
    let before = svc.blocks();

    svc.move_block(&budget, "into-ghost");
    assert_eq!(svc.blocks(), before);

    svc.move_block(&budget, &format!("after-{hiring}"));
    let order: Vec<String> = svc.blocks().into_iter().map(|b| b.id).collect();
    assert_eq!(order[1], hiring);
    assert_eq!(order[2], budget);
}

#[test]
fn pending_changes_track_edits_since_commit() {
    let (mut svc, planning, budget, _) = seeded();
    svc.commit().unwrap();
    assert!(svc.pending_changes().unwrap().is_empty());

    svc.delete_block(&budget).unwrap();
    let extra = svc
        .create_item(BlockKind::Topic, Some(planning), "Risks")
        .unwrap();

    let pending = svc.pending_changes().unwrap();
    let removed: Vec<&str> = pending.removed.iter().map(|t| t.id()).collect();
    let added: Vec<&str> = pending.added.iter().map(|t| t.id()).collect();
    assert_eq!(removed, [budget.as_str()]);
    assert_eq!(added, [extra.as_str()]);

    svc.commit().unwrap();
    assert!(svc.pending_changes().unwrap().is_empty());
}

#[test]
fn commit_and_reload_round_trip() {
    let (mut svc, _, _, _) = seeded();
    let payload = svc.commit().unwrap();
    let snapshot = svc.blocks();

    let mut other = service();
    other.load_serialized(&payload).unwrap();
    assert_eq!(other.blocks(), snapshot);
    assert!(other.pending_changes().unwrap().is_empty());
}

#[test]
fn apply_remote_verifies_and_folds_into_baseline() {
    let (mut svc, planning, budget, hiring) = seeded();
    svc.commit().unwrap();

    // A second replica makes an edit and ships the delta.
    let base = svc.blocks();
    let mut replica = service();
    replica.load(base.clone());
    replica.delete_block(&hiring).unwrap();
    let delta = replica.pending_changes().unwrap();

    svc.apply_remote(&delta).unwrap();
    let ids: Vec<String> = svc.blocks().into_iter().map(|b| b.id).collect();
    assert_eq!(ids, [planning, budget]);
    assert!(svc.pending_changes().unwrap().is_empty());

    let mut tampered = delta.clone();
    tampered.hash = "0".repeat(64);
    assert!(matches!(
        svc.apply_remote(&tampered),
        Err(AgendaServiceError::Codec(_))
    ));
}

#[test]
fn load_replaces_state_from_flat_snapshot() {
    let mut svc = service();
    svc.load(vec![
        Block::with_ids("s", BlockKind::Section, None, 0, "item-s"),
        Block::with_ids("t", BlockKind::Topic, Some("s".to_string()), 0, "item-t"),
    ]);

    let ids: Vec<String> = svc.blocks().into_iter().map(|b| b.id).collect();
    assert_eq!(ids, ["s", "t"]);
    // Loaded blocks have no payloads until content is authored separately.
    assert!(svc.content("t").is_none());
}
