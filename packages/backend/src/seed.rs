use uuid::Uuid;

use satprep_algo::DifficultyBand;

use crate::db::DatabaseProxy;

struct DemoItem {
    question_type_id: &'static str,
    difficulty: &'static str,
    stimulus: &'static str,
    options: [&'static str; 4],
    correct_answer: &'static str,
}

const DEMO_ITEMS: &[DemoItem] = &[
    DemoItem {
        question_type_id: "RW_IA_CENTRAL",
        difficulty: "D2",
        stimulus: "The following text is from a 1924 essay. Which choice best states the main idea?\n\n\"Education must train the student to think clearly and to act with purpose. Without these, information is useless.\"",
        options: [
            "Education should focus on facts.",
            "Education should develop clear thinking and purposeful action.",
            "Students need more free time.",
            "Information is the goal of school.",
        ],
        correct_answer: "Education should develop clear thinking and purposeful action.",
    },
    DemoItem {
        question_type_id: "RW_IA_INF",
        difficulty: "D2",
        stimulus: "Which choice best completes the text?\n\n\"Scientists have long debated whether birds evolved from dinosaurs. Recent fossil evidence _____.\"",
        options: [
            "has ended the debate",
            "suggests a close relationship between the two",
            "proves birds are older",
            "has been lost",
        ],
        correct_answer: "suggests a close relationship between the two",
    },
    DemoItem {
        question_type_id: "RW_EOI",
        difficulty: "D1",
        stimulus: "The writer wants to add a sentence that introduces the main topic. Which choice best does that?\n\n\"_____ The new policy will take effect in January.\"",
        options: [
            "The weather was nice.",
            "The company has announced a change to its leave policy.",
            "Many people prefer summer.",
            "January is a cold month.",
        ],
        correct_answer: "The company has announced a change to its leave policy.",
    },
    DemoItem {
        question_type_id: "RW_CS_STRUCTURE",
        difficulty: "D2",
        stimulus: "Which choice best states the purpose of the underlined sentence?\n\n\"The author uses this example to show how one idea can lead to another.\"",
        options: [
            "To introduce a new character",
            "To illustrate how ideas connect",
            "To summarize the paragraph",
            "To ask a question",
        ],
        correct_answer: "To illustrate how ideas connect",
    },
    DemoItem {
        question_type_id: "RW_IA_INF",
        difficulty: "D2",
        stimulus: "The text most strongly suggests that the author believes _____.",
        options: [
            "change is inevitable",
            "reading is optional",
            "practice improves skill",
            "everyone agrees",
        ],
        correct_answer: "practice improves skill",
    },
    DemoItem {
        question_type_id: "RW_CS_PURPOSE",
        difficulty: "D4",
        stimulus: "The author refers to \"the prevailing view\" primarily to _____.",
        options: [
            "establish a contrast with his own position",
            "cite an expert opinion",
            "define a technical term",
            "summarize the previous paragraph",
        ],
        correct_answer: "establish a contrast with his own position",
    },
    DemoItem {
        question_type_id: "RW_CS_STRUCTURE",
        difficulty: "D3",
        stimulus: "Which choice best describes the relationship between the two paragraphs?",
        options: [
            "The second contradicts the first.",
            "The second qualifies the first.",
            "The second repeats the first.",
            "The second introduces a new topic.",
        ],
        correct_answer: "The second qualifies the first.",
    },
];

/// Seeds a small fixed item bank for local runs. No-op once any items exist.
pub async fn seed_demo_items(proxy: &DatabaseProxy) {
    let pool = proxy.pool();

    let existing: i64 = match sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(pool)
        .await
    {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!(error = %err, "failed to inspect item bank, skipping demo seed");
            return;
        }
    };

    if existing > 0 {
        tracing::debug!(count = existing, "item bank not empty, skipping demo seed");
        return;
    }

    let mut seeded = 0;
    for item in DEMO_ITEMS {
        let irt_b = DifficultyBand::from_str(item.difficulty)
            .map(|band| band.irt_b())
            .unwrap_or(0.5);
        let options = serde_json::json!(item.options);

        if let Err(err) = sqlx::query(
            r#"
            INSERT INTO items
              (id, question_type_id, difficulty, stimulus, options, correct_answer, trap_ids, irt_b)
            VALUES ($1, $2, $3, $4, $5, $6, '[]'::jsonb, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(item.question_type_id)
        .bind(item.difficulty)
        .bind(item.stimulus)
        .bind(&options)
        .bind(item.correct_answer)
        .bind(irt_b)
        .execute(pool)
        .await
        {
            tracing::warn!(
                error = %err,
                question_type = item.question_type_id,
                "failed to seed demo item"
            );
        } else {
            seeded += 1;
        }
    }

    tracing::info!(count = seeded, "seeded demo item bank");
}
