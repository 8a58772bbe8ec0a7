#![no_main]

use libfuzzer_sys::fuzz_target;
use tabula_core::{bind_positional, find_markers, tokenize_params, Dialect, PlaceholderStyle};

fuzz_target!(|data: &[u8]| {
    let Ok(sql) = std::str::from_utf8(data) else {
        return;
    };

    for dialect in [Dialect::Mysql, Dialect::Postgres, Dialect::Sqlite] {
        let Ok(markers) = find_markers(sql, dialect) else {
            continue;
        };
        let params = tokenize_params(markers.iter().map(|m| (m.name.clone(), 0)));
        let (rewritten, values) =
            bind_positional(sql, dialect, &params).expect("every marker has a value");
        assert_eq!(values.len(), markers.len());

        // Putting the named markers back must give the input text.
        let mut restored = String::with_capacity(sql.len());
        let mut source_cursor = 0;
        let mut cursor = 0;
        for (index, found) in markers.iter().enumerate() {
            assert!(sql[found.span.clone()].starts_with(':'));
            let between = found.span.start - source_cursor;
            restored.push_str(&rewritten[cursor..cursor + between]);
            cursor += between;

            let placeholder = match dialect.placeholder_style() {
                PlaceholderStyle::QuestionMark => "?".to_string(),
                PlaceholderStyle::Numbered => format!("${}", index + 1),
            };
            assert!(rewritten[cursor..].starts_with(&placeholder));
            cursor += placeholder.len();

            restored.push_str(&sql[found.span.clone()]);
            source_cursor = found.span.end;
        }
        restored.push_str(&rewritten[cursor..]);
        assert_eq!(restored, sql);
    }
});
