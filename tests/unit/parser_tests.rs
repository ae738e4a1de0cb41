//! Parser unit tests
//!
//! Covers statement location, body literal forms, option clauses and
//! correlation identifier extraction on complete definition scripts.

use pg_funcsync::parser::{
    extract_correlation_id, parse_definition, FunctionAttributes, Language, LiteralDelimiter,
    ParallelSafety, RoutineKind, Volatility,
};
use pretty_assertions::assert_eq;

const ID: &str = "9968C379-A8C4-4D5A-9F23-4F79E7C3B5E9";

fn function_attributes(sql: &str) -> FunctionAttributes {
    parse_definition(sql)
        .expect("definition should parse")
        .function_attributes()
        .cloned()
        .expect("should be a function")
}

// ============================================================================
// Statement and name
// ============================================================================

#[test]
fn test_parse_create_or_replace_function() {
    let sql = "CREATE OR REPLACE FUNCTION public.add(a integer, b integer)\nRETURNS integer\nLANGUAGE sql\nAS $$\n  SELECT a + b;\n$$;";
    let parsed = parse_definition(sql).unwrap();

    assert_eq!(parsed.kind(), RoutineKind::Function);
    assert_eq!(parsed.schema.as_deref(), Some("public"));
    assert_eq!(parsed.name, "add");
    assert_eq!(parsed.qualified_name, "public.add");
    assert_eq!(parsed.argument_list, "a integer, b integer");
    assert_eq!(parsed.returns, "integer");
    assert_eq!(parsed.language, Language::Sql);
    assert_eq!(parsed.body_text(), "  SELECT a + b;");
    assert_eq!(parsed.raw_text, sql);
}

#[test]
fn test_parse_quoted_names() {
    let sql = "CREATE FUNCTION \"My Schema\".\"odd.name\"(x int) RETURNS int AS $$ SELECT x $$ LANGUAGE sql;";
    let parsed = parse_definition(sql).unwrap();

    assert_eq!(parsed.schema.as_deref(), Some("My Schema"));
    assert_eq!(parsed.name, "odd.name");
    assert_eq!(parsed.qualified_name, "My Schema.odd.name");
}

#[test]
fn test_parse_name_without_schema() {
    let parsed = parse_definition("create function Foo() returns void as $$ $$ language sql;").unwrap();
    assert_eq!(parsed.schema, None);
    assert_eq!(parsed.qualified_name, "Foo");
}

#[test]
fn test_parse_nested_argument_list() {
    let sql = "CREATE FUNCTION s.f(a numeric(10, 2) DEFAULT round(1.5), b text DEFAULT ')')\nRETURNS numeric AS $$ SELECT a $$ LANGUAGE sql;";
    let parsed = parse_definition(sql).unwrap();
    assert_eq!(
        parsed.argument_list,
        "a numeric(10, 2) DEFAULT round(1.5), b text DEFAULT ')'"
    );
    assert_eq!(parsed.returns, "numeric");
}

#[test]
fn test_parse_multiline_argument_list_normalizes_line_endings() {
    let sql = "CREATE FUNCTION s.f(\r\n  a int,\r\n  b int\r\n) RETURNS int AS $$ SELECT a $$ LANGUAGE sql;";
    let parsed = parse_definition(sql).unwrap();
    assert_eq!(parsed.argument_list, "  a int,\n  b int");
}

#[test]
fn test_parse_before_and_after_text() {
    let sql = "\n-- Adds numbers\n\nCREATE FUNCTION f() RETURNS int AS $$ SELECT 1 $$ LANGUAGE sql;\n\nGRANT EXECUTE ON FUNCTION f() TO app;\n";
    let parsed = parse_definition(sql).unwrap();
    assert_eq!(parsed.before_text, "-- Adds numbers");
    assert_eq!(parsed.after_text, "GRANT EXECUTE ON FUNCTION f() TO app;");
}

#[test]
fn test_parse_procedure() {
    let sql = "CREATE PROCEDURE app.log_event(msg text)\nLANGUAGE plpgsql\nSECURITY DEFINER\nAS $proc$\nBEGIN\n  INSERT INTO log VALUES (msg);\nEND;\n$proc$;";
    let parsed = parse_definition(sql).unwrap();

    assert_eq!(parsed.kind(), RoutineKind::Procedure);
    assert_eq!(parsed.qualified_name, "app.log_event");
    assert_eq!(parsed.returns, "");
    assert_eq!(parsed.language, Language::PlPgSql);
    assert!(parsed.is_security_definer);
    assert!(parsed.function_attributes().is_none());
    assert_eq!(
        parsed.body_literal.delimiter,
        LiteralDelimiter::Dollar {
            tag: "$proc$".to_string()
        }
    );
}

#[test]
fn test_parse_rejects_non_definitions() {
    assert!(parse_definition("CREATE TABLE t (id int);").is_none());
    assert!(parse_definition("CREATE VIEW v AS SELECT 1;").is_none());
    assert!(parse_definition("CREATE FUNCTION f() RETURNS int AS $$ SELECT 1;").is_none());
    assert!(parse_definition("CREATE FUNCTION f() RETURNS int AS 'SELECT 1").is_none());
    assert!(parse_definition("CREATE FUNCTION f() RETURNS int AS SELECT 1;").is_none());
}

#[test]
fn test_parse_statement_without_semicolon_runs_to_end_of_text() {
    let sql = "CREATE FUNCTION s.f(a int) RETURNS int AS $$ SELECT a $$ LANGUAGE sql IMMUTABLE";
    let parsed = parse_definition(sql).unwrap();

    assert_eq!(parsed.language, Language::Sql);
    assert_eq!(
        parsed.function_attributes().unwrap().volatility,
        Volatility::Immutable
    );
    assert_eq!(parsed.after_text, "");
}

// ============================================================================
// Body literal forms
// ============================================================================

#[test]
fn test_c_language_two_literal_body() {
    let sql = "CREATE FUNCTION s.f(int) RETURNS int AS '/usr/lib/mylib.so', 'my_symbol' LANGUAGE c;";
    let parsed = parse_definition(sql).unwrap();

    assert_eq!(parsed.body_text(), "/usr/lib/mylib.so");
    assert_eq!(parsed.body_literal_text(), "'/usr/lib/mylib.so', 'my_symbol'");
    assert_eq!(
        parsed.body_literal.delimiter,
        LiteralDelimiter::SingleQuoted {
            has_link_symbol: true
        }
    );
    assert_eq!(parsed.language, Language::C);
    assert_eq!(parsed.returns, "int");
}

#[test]
fn test_single_quoted_body_unescapes_quotes() {
    let sql = "CREATE FUNCTION f() RETURNS text AS 'SELECT ''it''''s''' LANGUAGE sql;";
    let parsed = parse_definition(sql).unwrap();
    assert_eq!(parsed.body_text(), "SELECT 'it''s'");
    assert_eq!(
        parsed.body_literal.delimiter,
        LiteralDelimiter::SingleQuoted {
            has_link_symbol: false
        }
    );
}

#[test]
fn test_dollar_body_contains_other_tags() {
    let sql = "CREATE FUNCTION f() RETURNS text AS $outer$\nSELECT $$inner;$$;\n$outer$ LANGUAGE sql;";
    let parsed = parse_definition(sql).unwrap();
    assert_eq!(parsed.body_text(), "SELECT $$inner;$$;");
    assert_eq!(parsed.after_text, "");
}

#[test]
fn test_as_inside_defaults_is_not_the_body_keyword() {
    let sql = "CREATE FUNCTION f(a text DEFAULT 'AS', \"as\" int) RETURNS int /* AS */ AS $$ SELECT 1 $$ LANGUAGE sql;";
    let parsed = parse_definition(sql).unwrap();
    assert_eq!(parsed.body_literal_text(), "$$ SELECT 1 $$");
    assert_eq!(parsed.argument_list, "a text DEFAULT 'AS', \"as\" int");
    assert_eq!(parsed.returns, "int");
}

#[test]
fn test_splice_body_literal_round_trip() {
    let inputs = [
        "CREATE FUNCTION f() RETURNS int AS $$\r\nSELECT 1;\r\n$$ LANGUAGE sql;\r\n",
        "-- header\nCREATE FUNCTION s.f(int) RETURNS int AS 'lib.so', 'sym' LANGUAGE c;",
        "CREATE PROCEDURE p() LANGUAGE sql AS $x$ SELECT 1 $x$;\nCOMMENT ON PROCEDURE p() IS 'p';",
    ];
    for sql in inputs {
        let parsed = parse_definition(sql).unwrap();
        assert_eq!(parsed.splice_body_literal(parsed.body_literal_text()), sql);
    }
}

// ============================================================================
// Option clauses
// ============================================================================

#[test]
fn test_options_before_and_after_body_agree() {
    let before = "CREATE FUNCTION s.f(a int) RETURNS int LANGUAGE sql IMMUTABLE AS $$ SELECT a $$;";
    let after = "CREATE FUNCTION s.f(a int) RETURNS int AS $$ SELECT a $$ LANGUAGE sql IMMUTABLE;";

    for sql in [before, after] {
        let parsed = parse_definition(sql).unwrap();
        assert_eq!(parsed.language, Language::Sql);
        assert_eq!(parsed.returns, "int");
        assert_eq!(
            parsed.function_attributes().unwrap().volatility,
            Volatility::Immutable
        );
    }
}

#[test]
fn test_keyword_in_body_comment_is_ignored() {
    let sql = "CREATE FUNCTION f() RETURNS int AS $$\n-- RETURNS nothing real\nSELECT 1;\n$$ LANGUAGE sql;";
    let parsed = parse_definition(sql).unwrap();
    assert_eq!(parsed.returns, "int");
}

#[test]
fn test_keywords_in_option_comments_are_ignored() {
    let sql = "CREATE FUNCTION f()\n/* RETURNS text */ RETURNS int -- STABLE\nLANGUAGE sql AS $$ SELECT 1 $$;";
    let attrs = function_attributes(sql);
    assert_eq!(attrs.volatility, Volatility::Volatile);
    assert_eq!(parse_definition(sql).unwrap().returns, "int");
}

#[test]
fn test_all_function_options() {
    let sql = "CREATE FUNCTION f(x int) RETURNS SETOF int\n  LANGUAGE plpgsql STABLE STRICT LEAKPROOF SECURITY DEFINER\n  COST 12.5 ROWS 100 PARALLEL SAFE\nAS $$ BEGIN RETURN NEXT x; END $$;";
    let parsed = parse_definition(sql).unwrap();
    let attrs = parsed.function_attributes().unwrap();

    assert_eq!(parsed.returns, "SETOF int");
    assert!(parsed.is_security_definer);
    assert_eq!(attrs.volatility, Volatility::Stable);
    assert!(attrs.is_strict);
    assert!(attrs.is_leakproof);
    assert_eq!(attrs.cost.as_deref(), Some("12.5"));
    assert_eq!(attrs.rows.as_deref(), Some("100"));
    assert_eq!(attrs.parallel, ParallelSafety::Safe);
    assert!(!attrs.is_window);
}

#[test]
fn test_option_defaults() {
    let attrs = function_attributes("CREATE FUNCTION f() RETURNS int AS $$ SELECT 1 $$ LANGUAGE sql;");
    assert_eq!(attrs, FunctionAttributes::default());
    assert_eq!(attrs.volatility, Volatility::Volatile);
    assert_eq!(attrs.parallel, ParallelSafety::Unsafe);
}

#[test]
fn test_not_leakproof_and_null_input_forms() {
    let attrs = function_attributes(
        "CREATE FUNCTION f(a int) RETURNS int NOT LEAKPROOF RETURNS NULL ON NULL INPUT AS $$ SELECT a $$ LANGUAGE sql;",
    );
    assert!(!attrs.is_leakproof);
    assert!(attrs.is_strict);
}

#[test]
fn test_window_function_and_parallel_restricted() {
    let attrs = function_attributes(
        "CREATE FUNCTION w() RETURNS int WINDOW PARALLEL RESTRICTED AS 'w_impl' LANGUAGE internal;",
    );
    assert!(attrs.is_window);
    assert_eq!(attrs.parallel, ParallelSafety::Restricted);
}

#[test]
fn test_quoted_and_user_defined_language() {
    let parsed =
        parse_definition("CREATE FUNCTION f() RETURNS int AS $$ return 1 $$ LANGUAGE \"plpython3u\";").unwrap();
    assert_eq!(
        parsed.language,
        Language::UserDefined(Some("plpython3u".to_string()))
    );
    assert_eq!(parsed.language.to_string(), "user-defined (plpython3u)");

    let parsed = parse_definition("CREATE FUNCTION f() RETURNS int AS $$ x $$;").unwrap();
    assert_eq!(parsed.language, Language::UserDefined(None));
}

// ============================================================================
// Trailing comment
// ============================================================================

#[test]
fn test_trailing_comment_is_extracted() {
    let sql = "CREATE FUNCTION s.f(a int) RETURNS int AS $$ SELECT a $$ LANGUAGE sql;\nCOMMENT ON FUNCTION s.f(int) IS 'desc text';\n-- end of file";
    let parsed = parse_definition(sql).unwrap();

    assert_eq!(parsed.trailing_comment.as_deref(), Some("desc text"));
    assert_eq!(parsed.after_text, "-- end of file");
    assert_eq!(parsed.language, Language::Sql);
}

#[test]
fn test_trailing_comment_is_not_an_option_source() {
    let sql = "CREATE FUNCTION s.f() RETURNS int AS $$ SELECT 1 $$ LANGUAGE sql;\nCOMMENT ON FUNCTION s.f() IS 'IMMUTABLE STRICT';";
    let parsed = parse_definition(sql).unwrap();
    let attrs = parsed.function_attributes().unwrap();

    assert_eq!(parsed.trailing_comment.as_deref(), Some("IMMUTABLE STRICT"));
    assert_eq!(attrs.volatility, Volatility::Volatile);
    assert!(!attrs.is_strict);
}

#[test]
fn test_dollar_quoted_trailing_comment() {
    let sql = "CREATE PROCEDURE p() AS $$ SELECT 1 $$ LANGUAGE sql;\r\nCOMMENT ON PROCEDURE p() IS $c$Line one\r\nit's line two$c$;";
    let parsed = parse_definition(sql).unwrap();
    assert_eq!(
        parsed.trailing_comment.as_deref(),
        Some("Line one\nit's line two")
    );
}

#[test]
fn test_mismatched_dollar_tag_comment_is_left_in_after_text() {
    let sql = "CREATE FUNCTION f() RETURNS int AS $$ SELECT 1 $$ LANGUAGE sql;\nCOMMENT ON FUNCTION f() IS $ab$\u{20AC}$$;";
    let parsed = parse_definition(sql).unwrap();

    assert_eq!(parsed.trailing_comment, None);
    assert_eq!(parsed.body_text(), " SELECT 1 ");
    assert_eq!(parsed.after_text, "COMMENT ON FUNCTION f() IS $ab$\u{20AC}$$;");

    let ascii = "CREATE FUNCTION f() RETURNS int AS $$ SELECT 1 $$ LANGUAGE sql;\nCOMMENT ON FUNCTION f() IS $ab$ x $$;";
    assert_eq!(parse_definition(ascii).unwrap().trailing_comment, None);
}

#[test]
fn test_comment_statement_inside_body_cuts_the_definition() {
    // The trailing comment search does not skip literals, so a COMMENT ON
    // statement inside the body ends the definition inside the body.
    let sql = "CREATE FUNCTION s.f() RETURNS void AS $$\nCOMMENT ON FUNCTION s.g() IS 'inner';\n$$ LANGUAGE sql;";
    assert!(parse_definition(sql).is_none());
}

// ============================================================================
// Correlation identifier
// ============================================================================

#[test]
fn test_correlation_id_in_body() {
    let sql = format!(
        "CREATE FUNCTION f() RETURNS int AS $$\nBEGIN\n  -- @GUID {{{ID}}} - keep\n  RETURN 1;\nEND;\n$$ LANGUAGE plpgsql;"
    );
    let parsed = parse_definition(&sql).unwrap();
    assert_eq!(parsed.correlation_id, Some(format!("{{{ID}}}")));
}

#[test]
fn test_correlation_id_anywhere_in_text() {
    let lower = ID.to_lowercase();
    assert_eq!(
        extract_correlation_id(&format!("-- header @GUID{{{lower}}}\nSELECT 1;")),
        Some(format!("{{{lower}}}"))
    );
}

#[test]
fn test_correlation_id_requires_valid_uuid() {
    // Version nibble 0 and variant nibble c are both outside RFC 4122 v1-5
    assert_eq!(
        extract_correlation_id("@GUID {9968C379-A8C4-0D5A-9F23-4F79E7C3B5E9}"),
        None
    );
    assert_eq!(
        extract_correlation_id("@GUID {9968C379-A8C4-4D5A-CF23-4F79E7C3B5E9}"),
        None
    );
    assert_eq!(extract_correlation_id("@GUID {not-a-guid}"), None);
}
