use serde_json::{Value, json};

use fantasy_domain::{
	Pagination,
	normalize::{self, decode_tags},
};

fn raw_record(tags: Value) -> Value {
	json!({
		"id": "r1",
		"title": "Floating library",
		"content": "Books that drift between clouds.",
		"snippet": "Books that drift",
		"tags": tags,
		"mood": "充满希望",
		"userId": "u1",
		"createdAt": "2024-01-01T08:00:00.000Z",
		"updatedAt": "2024-01-02T08:00:00.000Z"
	})
}

#[test]
fn tag_decoding_never_fails() {
	let cases = [
		(json!(["a", "b"]), vec!["a", "b"]),
		(json!("[\"a\",\"b\"]"), vec!["a", "b"]),
		(Value::Null, vec![]),
		(json!("{not json"), vec![]),
		(json!("\"just a string\""), vec![]),
		(json!(""), vec![]),
		(json!(42), vec![]),
		(json!({ "a": 1 }), vec![]),
	];

	for (raw, expected) in cases {
		assert_eq!(decode_tags(Some(&raw)), expected, "Unexpected tags for {raw}");
	}

	assert!(decode_tags(None).is_empty());
}

#[test]
fn malformed_tag_string_yields_empty_tags() {
	let record = normalize::normalize_record(&raw_record(json!("{not json")));

	assert!(record.tags.is_empty());
	assert_eq!(record.title, "Floating library");
}

#[test]
fn stringified_tags_match_array_tags() {
	let from_array = normalize::normalize_record(&raw_record(json!(["sky", "books"])));
	let from_string = normalize::normalize_record(&raw_record(json!("[\"sky\",\"books\"]")));

	assert_eq!(from_array, from_string);
}

#[test]
fn content_and_snippet_fill_each_other() {
	let only_snippet = normalize::normalize_record(&json!({ "id": "1", "title": "t", "snippet": "short" }));
	let only_content = normalize::normalize_record(&json!({ "id": "2", "title": "t", "content": "long body" }));
	let neither = normalize::normalize_record(&json!({ "id": "3", "title": "t" }));

	assert_eq!(only_snippet.content, "short");
	assert_eq!(only_snippet.snippet, "short");
	assert_eq!(only_content.snippet, "long body");
	assert_eq!(only_content.body(), "long body");
	assert!(neither.content.is_empty() && neither.snippet.is_empty());
}

#[test]
fn defaults_category_and_attachments() {
	let record = normalize::normalize_record(&json!({ "id": 7, "title": "t", "content": "c" }));

	assert_eq!(record.id, "7");
	assert!(record.category.is_none());
	assert!(record.attachments.is_empty());
	assert!(record.created_at.is_none());

	let with_category = normalize::normalize_record(&json!({
		"id": "8",
		"title": "t",
		"categoryId": "c1",
		"attachments": "[\"a1\",\"a2\"]"
	}));

	assert_eq!(with_category.category.map(|category| category.id), Some("c1".to_string()));
	assert_eq!(with_category.attachments, vec!["a1", "a2"]);
}

#[test]
fn unparsable_timestamps_become_absent() {
	let record = normalize::normalize_record(&json!({
		"id": "1",
		"title": "t",
		"createdAt": "last tuesday",
		"updatedAt": "2024-03-04"
	}));

	assert!(record.created_at.is_none());
	assert!(record.updated_at.is_some());
}

#[test]
fn nested_and_flattened_envelopes_agree() {
	let records = json!([raw_record(json!(["a"])), raw_record(json!("[\"b\"]"))]);
	let pagination = json!({ "currentPage": 2, "totalPages": 4, "totalRecords": 31 });
	let nested = json!({ "success": true, "data": { "records": records, "pagination": pagination } });
	let flattened = json!({ "success": true, "records": records, "pagination": pagination });
	let typed = json!({
		"success": true,
		"data": records,
		"pagination": { "page": 2, "limit": 10, "total": 31, "totalPages": 4 }
	});
	let nested = normalize::normalize_records_page(&nested);

	assert_eq!(nested, normalize::normalize_records_page(&flattened));
	assert_eq!(nested, normalize::normalize_records_page(&typed));
	assert_eq!(nested.records.len(), 2);
	assert_eq!(nested.records[1].tags, vec!["b"]);
	assert_eq!(nested.pagination, Pagination { current_page: 2, total_pages: 4, total_records: 31 });
}

#[test]
fn unknown_envelope_yields_empty_page() {
	for raw in [json!({ "success": true, "items": [] }), json!(null), json!("oops"), json!({ "data": null })] {
		let page = normalize::normalize_records_page(&raw);

		assert!(page.records.is_empty());
		assert_eq!(page.pagination, Pagination::default());
	}
}

#[test]
fn missing_pagination_assumes_single_page() {
	let page = normalize::normalize_records_page(&json!({ "records": [raw_record(json!([]))] }));

	assert_eq!(page.pagination, Pagination { current_page: 1, total_pages: 1, total_records: 1 });
}

#[test]
fn non_object_entries_are_skipped() {
	let page = normalize::normalize_records_page(&json!({
		"data": { "records": [raw_record(json!([])), "garbage", 3], "pagination": {} }
	}));

	assert_eq!(page.records.len(), 1);
}

#[test]
fn attachment_and_user_payloads() {
	let attachment = normalize::normalize_attachment(&json!({
		"id": 12,
		"url": "/uploads/a.png",
		"fileName": "a.png",
		"fileType": "image/png",
		"fileSize": 2048,
		"createdAt": "2024-01-01T00:00:00Z"
	}))
	.expect("Attachment must parse.");

	assert_eq!(attachment.id, "12");
	assert_eq!(attachment.file_size, Some(2048));
	assert!(attachment.record_id.is_none());
	assert!(normalize::normalize_attachment(&json!({ "id": "x" })).is_none());

	let user = normalize::normalize_user(&json!({
		"id": "u1",
		"username": "dreamer",
		"email": "d@example.com",
		"createdAt": "not a date"
	}))
	.expect("User must parse.");

	assert_eq!(user.username, "dreamer");
	assert!(user.created_at.is_none());
}

#[test]
fn analytics_payloads_accept_both_chart_shapes() {
	let plain = normalize::normalize_mood_trend(&json!({ "labels": ["1/1", "1/5"], "dataPoints": [7, 8.5] }));
	let dataset = normalize::normalize_mood_trend(&json!({
		"labels": ["1/1", "1/5"],
		"datasets": [{ "data": [7, 8.5], "borderColor": "#4A90E2" }]
	}));

	assert_eq!(plain.data_points, dataset.data_points);
	assert_eq!(dataset.border_color.as_deref(), Some("#4A90E2"));
	assert_eq!(plain.points().collect::<Vec<_>>(), vec![("1/1", 7.0), ("1/5", 8.5)]);

	let analysis = normalize::normalize_mental_state(&json!({
		"emotionChartData": { "labels": ["w1"], "datasets": [{ "data": [6] }] },
		"themeWordCloud": [{ "text": "AI", "value": 17 }, { "value": 3 }],
		"summaryReport": "Mostly hopeful."
	}));

	assert_eq!(analysis.emotion_chart.labels, vec!["w1"]);
	assert_eq!(analysis.theme_words.len(), 1);
	assert_eq!(analysis.summary_report, "Mostly hopeful.");

	let summary = normalize::normalize_records_summary(&json!({
		"totalRecords": 12,
		"thisMonth": 3,
		"topTags": [{ "tag": "AI", "count": 4 }, "story"]
	}));

	assert_eq!(summary.counts.get("totalRecords"), Some(&json!(12)));
	assert_eq!(summary.top_tags.len(), 2);
	assert_eq!(summary.top_tags[1].tag, "story");
}
