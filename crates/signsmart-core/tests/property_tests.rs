//! Property-based tests for the editor and signing wizard
//!
//! Random edit sequences must never leave a field pointing at a missing
//! signer, and the finish gate must never close once it has opened.

use proptest::prelude::*;
use signsmart_core::{
    Document, Editor, FieldType, PageBounds, Position, SignaturePad, SignerWizard,
};

// ============================================================
// Strategies
// ============================================================

fn field_type() -> impl Strategy<Value = FieldType> {
    prop::sample::select(FieldType::ALL.to_vec())
}

#[derive(Debug, Clone)]
enum EditOp {
    AddSigner,
    RemoveSigner(usize),
    AddField(FieldType, f64, f64),
    RemoveField(usize),
    Assign(usize, usize),
    Drag(usize, f64, f64),
}

fn edit_op() -> impl Strategy<Value = EditOp> {
    prop_oneof![
        Just(EditOp::AddSigner),
        (0usize..6).prop_map(EditOp::RemoveSigner),
        (field_type(), -50.0f64..150.0, -50.0f64..150.0)
            .prop_map(|(t, x, y)| EditOp::AddField(t, x, y)),
        (0usize..12).prop_map(EditOp::RemoveField),
        (0usize..12, 0usize..6).prop_map(|(f, s)| EditOp::Assign(f, s)),
        (0usize..12, -500.0f64..1500.0, -500.0f64..1500.0)
            .prop_map(|(f, x, y)| EditOp::Drag(f, x, y)),
    ]
}

/// Apply one op, picking targets by index; misses are expected rejections
fn apply(editor: &mut Editor, op: &EditOp) {
    let signers: Vec<String> = editor.document().signers.iter().map(|s| s.id.clone()).collect();
    let fields: Vec<String> = editor.document().fields.iter().map(|f| f.id.clone()).collect();
    let signer_at = |i: usize| signers.get(i).cloned();
    let field_at = |i: usize| fields.get(i).cloned();

    match op {
        EditOp::AddSigner => {
            editor.add_signer();
        }
        EditOp::RemoveSigner(i) => {
            let id = signer_at(*i).unwrap_or_else(|| "missing".into());
            let _ = editor.remove_signer(&id);
        }
        EditOp::AddField(t, x, y) => {
            let _ = editor.add_field(*t, Position { x: *x, y: *y });
        }
        EditOp::RemoveField(i) => {
            let id = field_at(*i).unwrap_or_else(|| "missing".into());
            let _ = editor.remove_field(&id);
        }
        EditOp::Assign(f, s) => {
            let field = field_at(*f).unwrap_or_else(|| "missing".into());
            let signer = signer_at(*s).unwrap_or_else(|| "missing".into());
            let _ = editor.assign_field(&field, &signer);
        }
        EditOp::Drag(f, x, y) => {
            if let Some(id) = field_at(*f) {
                let bounds = PageBounds::new(100.0, 50.0, 800.0, 1000.0);
                if editor.begin_move(&id).is_ok() {
                    editor.drag_to(*x, *y, bounds);
                    editor.end_move();
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // ============================================================
    // Editor invariants
    // ============================================================

    #[test]
    fn fields_always_reference_existing_signers(ops in prop::collection::vec(edit_op(), 0..40)) {
        let mut editor = Editor::new(Document::from_upload("deal.pdf", None));
        for op in &ops {
            apply(&mut editor, op);
            prop_assert!(editor.document().references_are_valid());
        }
        let saved = editor.save();
        prop_assert!(saved.dangling_fields().is_empty());
    }

    #[test]
    fn positions_stay_on_page(ops in prop::collection::vec(edit_op(), 0..40)) {
        let mut editor = Editor::new(Document::from_upload("deal.pdf", None));
        for op in &ops {
            apply(&mut editor, op);
        }
        for field in &editor.document().fields {
            prop_assert!((0.0..=100.0).contains(&field.x));
            prop_assert!((0.0..=100.0).contains(&field.y));
        }
    }

    #[test]
    fn add_field_without_signers_changes_nothing(
        t in field_type(),
        x in -100.0f64..200.0,
        y in -100.0f64..200.0
    ) {
        let mut editor = Editor::new(Document::from_upload("deal.pdf", None));
        let before = editor.document().clone();
        let added = editor.add_field(t, Position { x, y });
        prop_assert!(added.is_err());
        prop_assert_eq!(editor.document(), &before);
    }

    // ============================================================
    // Wizard invariants
    // ============================================================

    #[test]
    fn finish_gate_is_monotonic(
        inputs in prop::collection::vec((0usize..6, "[ a-z]{0,6}"), 0..30)
    ) {
        let mut editor = Editor::new(Document::from_upload("form.pdf", None));
        editor.add_named_signer("Dana", "", "");
        for t in [FieldType::Text, FieldType::Date, FieldType::Amount, FieldType::Signature] {
            editor.add_field(t, Position::center()).unwrap();
        }
        let doc = editor.save();
        let mut wizard = SignerWizard::new(&doc, None);

        let mut pad = SignaturePad::default();
        pad.pointer_down(10.0, 10.0);
        pad.pointer_move(40.0, 30.0);
        pad.pointer_up();

        let mut was_open = false;
        let mut last_filled = 0;
        for (index, text) in &inputs {
            if wizard.select(*index).is_ok() {
                if wizard.enter_text(text).is_err() {
                    let _ = wizard.confirm_signature(&pad);
                }
            }
            prop_assert!(wizard.filled_count() >= last_filled);
            last_filled = wizard.filled_count();

            if was_open {
                prop_assert!(wizard.can_finish());
            }
            was_open = wizard.can_finish();
        }
    }
}
