//! Property tests for selection, commit history, boundaries, and paging.

use featlens_core::ItemKey;
use featlens_tagging::{
    BoundaryThresholds, CommitHistory, CommitType, HistoryConfig, Paginator, ScoreMap,
    SelectionMode, SelectionState, TagAllStrategy, TagState, classify_boundary_items,
};
use proptest::prelude::*;

const GATE: f64 = 0.83;

fn tag_state() -> impl Strategy<Value = TagState> {
    prop_oneof![Just(TagState::Selected), Just(TagState::Rejected)]
}

/// Manual tags over features `0..32`.
fn manual_tags() -> impl Strategy<Value = Vec<(u32, TagState)>> {
    prop::collection::vec((0u32..32, tag_state()), 0..16)
}

/// Scores over features `0..32`, some features unscored.
fn scores() -> impl Strategy<Value = ScoreMap> {
    prop::collection::vec((0u32..32, -1.0f64..1.0), 0..32)
        .prop_map(|pairs| pairs.into_iter().map(|(id, s)| (ItemKey::Feature(id), s)).collect())
}

fn items() -> Vec<ItemKey> {
    (0..32).map(ItemKey::Feature).collect()
}

fn selection_from(tags: &[(u32, TagState)]) -> SelectionState {
    let mut sel = SelectionState::new(SelectionMode::Feature);
    for &(id, state) in tags {
        sel.set_manual(ItemKey::Feature(id), Some(state)).unwrap();
    }
    sel
}

#[derive(Debug, Clone)]
enum PageOp {
    SetLen(usize),
    SetPageSize(usize),
    SetIndex(usize),
    GotoPage(usize),
    NextPage,
    PrevPage,
    NextItem,
    PrevItem,
}

fn page_op() -> impl Strategy<Value = PageOp> {
    prop_oneof![
        (0usize..200).prop_map(PageOp::SetLen),
        (0usize..30).prop_map(PageOp::SetPageSize),
        (0usize..300).prop_map(PageOp::SetIndex),
        (0usize..40).prop_map(PageOp::GotoPage),
        Just(PageOp::NextPage),
        Just(PageOp::PrevPage),
        Just(PageOp::NextItem),
        Just(PageOp::PrevItem),
    ]
}

proptest! {
    #[test]
    fn tag_all_keeps_existing_tags(
        tags in manual_tags(),
        scores in scores(),
        by_boundary in any::<bool>(),
    ) {
        let mut sel = selection_from(&tags);
        let before = sel.clone();
        let strategy = if by_boundary {
            TagAllStrategy::ByDecisionBoundary
        } else {
            TagAllStrategy::AsDefault
        };
        let outcome = sel.tag_all(items(), strategy, &scores, 1.0, GATE).unwrap();

        for (key, tag) in before.iter() {
            prop_assert_eq!(sel.get(key), Some(*tag));
        }
        prop_assert_eq!(sel.len(), 32);
        prop_assert_eq!(outcome.selected + outcome.rejected, 32 - before.len());
    }

    #[test]
    fn tag_all_below_gate_changes_nothing(
        tags in manual_tags(),
        score in 0.0f64..GATE,
    ) {
        let mut sel = selection_from(&tags);
        let before = sel.clone();
        prop_assert!(sel
            .tag_all(items(), TagAllStrategy::AsDefault, &ScoreMap::default(), score, GATE)
            .is_err());
        prop_assert_eq!(sel, before);
    }

    #[test]
    fn apply_threshold_is_idempotent(
        tags in manual_tags(),
        scores in scores(),
        a in -1.0f64..1.0,
        b in -1.0f64..1.0,
    ) {
        let boundary = BoundaryThresholds::new(a.min(b), a.max(b)).unwrap();
        let mut sel = selection_from(&tags);
        sel.apply_threshold(items(), &scores, boundary);
        let once = sel.clone();
        let second = sel.apply_threshold(items(), &scores, boundary);
        prop_assert_eq!(second.selected, 0);
        prop_assert_eq!(second.rejected, 0);
        prop_assert_eq!(sel, once);
    }

    #[test]
    fn boundary_lists_are_disjoint_and_ordered(
        scores in scores(),
        a in -1.0f64..1.0,
        b in -1.0f64..1.0,
    ) {
        let boundary = BoundaryThresholds::new(a.min(b), a.max(b)).unwrap();
        let lists = classify_boundary_items(items(), &scores, boundary);
        for item in &lists.reject_below {
            prop_assert!(item.score < boundary.reject);
            prop_assert!(lists.select_above.iter().all(|s| s.key != item.key));
        }
        for item in &lists.select_above {
            prop_assert!(item.score >= boundary.select);
        }
        prop_assert!(lists.reject_below.windows(2).all(|w| w[0].score >= w[1].score));
        prop_assert!(lists.select_above.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn history_respects_cap(max in 0usize..12, n in 0usize..40) {
        let sel = SelectionState::new(SelectionMode::Feature);
        let mut history = CommitHistory::new(HistoryConfig::new(max), &sel, None);
        for _ in 0..n {
            history.create_commit(CommitType::Apply, &sel, None);
        }
        let cap = max.max(2);
        prop_assert_eq!(history.len(), (n + 1).min(cap));
        prop_assert_eq!(history.initial().id, 0);
        prop_assert_eq!(history.initial().commit_type, CommitType::Initial);
        prop_assert_eq!(history.cursor(), history.len() - 1);
        prop_assert!(history.commits().windows(2).all(|w| w[0].id < w[1].id));
        if n > 0 {
            prop_assert_eq!(history.current().id, n as u64);
        }
    }

    #[test]
    fn commit_click_is_idempotent(
        edits in prop::collection::vec(manual_tags(), 1..6),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut sel = SelectionState::new(SelectionMode::Feature);
        let mut history = CommitHistory::new(HistoryConfig::default(), &sel, None);
        for batch in &edits {
            sel = selection_from(batch);
            history.create_commit(CommitType::Apply, &sel, None);
        }
        let index = pick.index(history.len());
        history.handle_commit_click(index, &mut sel).unwrap();
        let once = sel.clone();
        let commits = history.commits().to_vec();
        history.handle_commit_click(index, &mut sel).unwrap();
        prop_assert_eq!(&sel, &once);
        prop_assert_eq!(history.commits(), commits.as_slice());
        prop_assert_eq!(history.cursor(), index);
    }

    #[test]
    fn pager_index_stays_in_range(
        len in 0usize..200,
        ops in prop::collection::vec(page_op(), 0..40),
    ) {
        let mut pager = Paginator::new(len, 10);
        for op in ops {
            match op {
                PageOp::SetLen(n) => pager.set_len(n),
                PageOp::SetPageSize(n) => pager.set_page_size(n),
                PageOp::SetIndex(i) => pager.set_index(i),
                PageOp::GotoPage(p) => pager.goto_page(p),
                PageOp::NextPage => {
                    pager.next_page();
                }
                PageOp::PrevPage => {
                    pager.prev_page();
                }
                PageOp::NextItem => pager.next_item(),
                PageOp::PrevItem => pager.prev_item(),
            }
            if pager.is_empty() {
                prop_assert_eq!(pager.current_index(), 0);
            } else {
                prop_assert!(pager.current_index() < pager.len());
                prop_assert!(pager.current_page() < pager.page_count());
            }
            prop_assert!(pager.page_range().len() <= pager.page_size());
        }
    }
}
