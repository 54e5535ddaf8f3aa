//! Property tests for the task API wire format.
//!
//! Uses proptest to verify:
//! 1. A task with arbitrary pass-through fields survives JSON encode and decode.
//! 2. Arbitrary bytes never panic the task or error-body decoders.
//! 3. Local validation agrees with the documented length limits.
//! 4. Applying a patch only touches the fields it carries.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use serde_json::{Map, Value};

use taskdeck_proto::error::error_message;
use taskdeck_proto::task::{
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, Task, TaskCreate, TaskId, TaskUpdate,
    ValidationError,
};

/// Scalar JSON values the server may attach to a task.
fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,24}".prop_map(Value::String),
        Just(Value::Null),
    ]
}

/// Extra fields under keys that cannot collide with the known ones.
fn arb_extra() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("x_[a-z]{1,8}", arb_scalar(), 0..5)
        .prop_map(|m| m.into_iter().collect())
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        any::<i64>(),
        "[^\u{0}]{1,64}",
        proptest::option::of("[^\u{0}]{0,128}"),
        any::<bool>(),
        arb_extra(),
    )
        .prop_map(|(id, title, description, done, extra)| {
            let mut task = Task::new(TaskId::new(id), title);
            task.description = description;
            task.is_completed = done;
            task.extra = extra;
            task
        })
}

proptest! {
    /// Tasks, including unknown fields, survive a JSON round-trip.
    #[test]
    fn task_json_round_trip(task in arb_task()) {
        let json = serde_json::to_string(&task).expect("encode should succeed");
        let decoded: Task = serde_json::from_str(&json).expect("decode should succeed");
        prop_assert_eq!(task, decoded);
    }

    /// Random bytes never panic the task decoder.
    #[test]
    fn random_bytes_decode_no_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = serde_json::from_slice::<Task>(&bytes);
        let _ = serde_json::from_slice::<Vec<Task>>(&bytes);
    }

    /// Error bodies of any shape yield a non-empty message.
    #[test]
    fn error_message_never_empty(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let message = error_message(&bytes, "fallback");
        prop_assert!(!message.is_empty());
    }

    /// A string `detail` is reported verbatim.
    #[test]
    fn string_detail_is_verbatim(detail in "[a-zA-Z0-9 .,]{1,64}") {
        let body = serde_json::json!({ "detail": detail }).to_string();
        prop_assert_eq!(error_message(body.as_bytes(), "fallback"), detail);
    }

    /// Titles are accepted exactly when non-blank and within the limit.
    #[test]
    fn title_validation_matches_limits(title in "[a-z ]{0,300}") {
        let result = TaskCreate::new(title.clone()).validate();
        let len = title.chars().count();
        if title.trim().is_empty() {
            prop_assert_eq!(result, Err(ValidationError::TitleEmpty));
        } else if len > MAX_TITLE_LENGTH {
            prop_assert_eq!(
                result,
                Err(ValidationError::TitleTooLong { len, max: MAX_TITLE_LENGTH })
            );
        } else {
            prop_assert_eq!(result, Ok(()));
        }
    }

    /// Descriptions count characters, not bytes.
    #[test]
    fn description_limit_counts_chars(extra in 0usize..4) {
        let at_limit = "é".repeat(MAX_DESCRIPTION_LENGTH);
        let ok = TaskCreate::new("t").with_description(at_limit);
        prop_assert_eq!(ok.validate(), Ok(()));

        let over = "é".repeat(MAX_DESCRIPTION_LENGTH + 1 + extra);
        let rejected = TaskCreate::new("t").with_description(over).validate();
        let rejected_too_long = matches!(rejected, Err(ValidationError::DescriptionTooLong { .. }));
        prop_assert!(rejected_too_long);
    }

    /// A patch changes only the fields it carries and keeps pass-through data.
    #[test]
    fn patch_touches_only_present_fields(
        task in arb_task(),
        title in proptest::option::of("[a-z]{1,16}"),
        done in proptest::option::of(any::<bool>()),
    ) {
        let patch = TaskUpdate { title: title.clone(), description: None, is_completed: done };
        let patched = patch.apply_to(&task);

        prop_assert_eq!(patched.id, task.id);
        prop_assert_eq!(&patched.description, &task.description);
        prop_assert_eq!(&patched.extra, &task.extra);
        prop_assert_eq!(&patched.title, title.as_ref().unwrap_or(&task.title));
        prop_assert_eq!(patched.is_completed, done.unwrap_or(task.is_completed));

        let json = serde_json::to_value(&patch).expect("encode should succeed");
        let keys = json.as_object().map_or(0, Map::len);
        prop_assert_eq!(keys, usize::from(title.is_some()) + usize::from(done.is_some()));
    }
}
