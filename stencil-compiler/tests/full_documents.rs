//! Whole-document translation: mixed directives, literals and raw blocks.

use std::path::Path;

use stencil_compiler::{translate, CompileError};
use stencil_core::{Options, Params, Value};

fn text_of(template: &str) -> String {
    translate(template, None, &Params::new(), &Options::default(), 0)
        .expect("translate")
        .text()
}

#[test]
fn mixed_document_translates_in_order() {
    let template = "\
% name = 'adder'
Module ${name}
% for i in range(2):
  port p${i};
% end
<%
param.ports = 2
%>
done";
    let text = text_of(template);
    let statements: Vec<&str> = text
        .lines()
        .map(|l| match l.find(" # template line") {
            Some(cut) => l[..cut].trim_end(),
            None => l,
        })
        .collect();
    assert_eq!(
        statements,
        vec![
            "param = params('')",
            "param = merge(param, {})",
            "end = none",
            "endfor = none",
            "endif = none",
            "# --- payload begins ---",
            "name = 'adder'",
            "emit(f'Module {name}')",
            "for i in range(2):",
            "    emit(f'  port p{i};')",
            "end",
            "# raw begins",
            "param.ports = 2",
            "# raw ends",
            "emit(f'done')",
            "# --- payload ends ---",
            "_render = emitted()",
            "export(param)",
        ]
    );
}

#[test]
fn every_payload_line_is_annotated_with_its_template_line() {
    let template = "% x = 1\nliteral\n<%\ny = 2\n%>";
    let program = translate(template, None, &Params::new(), &Options::default(), 0)
        .expect("translate");
    let annotated: Vec<(String, usize)> = program
        .text()
        .lines()
        .filter_map(|l| {
            let cut = l.find(" # template line")?;
            let n = l.rsplit(' ').next()?.parse().ok()?;
            Some((l[..cut].trim_end().to_string(), n))
        })
        .collect();
    assert_eq!(
        annotated,
        vec![
            ("x = 1".to_string(), 1),
            ("emit(f'literal')".to_string(), 2),
            ("# raw begins".to_string(), 3),
            ("y = 2".to_string(), 4),
            ("# raw ends".to_string(), 5),
        ]
    );
}

#[test]
fn escaper_errors_carry_the_document_line_number() {
    let err = translate(
        "fine\nalso fine\nbad ${x",
        None,
        &Params::new(),
        &Options::default(),
        0,
    )
    .unwrap_err();
    assert!(
        matches!(err, CompileError::UnterminatedExpression { line_no: 3, .. }),
        "got {err:?}"
    );
}

#[test]
fn overrides_from_a_previous_pass_round_trip_through_the_prologue() {
    // A chained pass hands back nested values; they must survive as
    // script literals.
    let mut overrides = Params::new();
    overrides.set(
        "ports",
        Value::List(vec![Value::Str("clk".into()), Value::Str("rst".into())]),
    );
    overrides.set("width", Value::Int(8));
    let program = translate(
        "x",
        Some(Path::new("p.json")),
        &overrides,
        &Options::default(),
        0,
    )
    .expect("translate");
    let text = program.text();
    assert!(
        text.contains("param = merge(param, {'ports': ['clk', 'rst'], 'width': 8})"),
        "{text}"
    );
    assert!(text.contains("param = params('p.json')"), "{text}");
}
