//! Circom source rendering.
//!
//! The renderer only walks a precomputed [`CircuitLayout`]; signal names,
//! their order and the public outputs all come from the layout. Gadgets
//! (range checks, EdDSA, SMT verification) live in the fixed protocol
//! library included at the top of every circuit.

use std::fmt::Write as _;

use super::compiler::{CircuitLayout, InputSignal};
use super::field_def::FieldDef;
use crate::types::ClaimType;

const CIRCOM_VERSION: &str = "2.1.5";
const PROTOCOL_LIBRARY: &str = "babyzk/credential.circom";

/// Line-oriented source builder with indentation.
#[derive(Debug, Default)]
pub struct CodeBuilder {
    buf: String,
    indent: usize,
}

impl CodeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one indented line.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        for _ in 0..self.indent {
            self.buf.push_str("    ");
        }
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// Emit `header {` and indent.
    pub fn open(&mut self, header: impl AsRef<str>) -> &mut Self {
        self.line(format!("{} {{", header.as_ref()));
        self.indent += 1;
        self
    }

    /// Close the innermost block.
    pub fn close(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self.line("}")
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

fn declare_input(b: &mut CodeBuilder, input: &InputSignal) {
    match input.len {
        Some(n) => b.line(format!("signal input {}[{n}];", input.name)),
        None => b.line(format!("signal input {};", input.name)),
    };
}

/// Render the main circuit for a layout.
pub fn render(layout: &CircuitLayout) -> String {
    let mut b = CodeBuilder::new();
    let body_limbs: Vec<&str> = layout.fields.input_names();

    b.line(format!("pragma circom {CIRCOM_VERSION};"))
        .blank()
        .line(format!("include \"{PROTOCOL_LIBRARY}\";"))
        .blank();

    let mut header = String::new();
    let _ = write!(header, "// type {}: {} claim(s)", layout.type_id, layout.fields.defs().len());
    if let Some(depth) = layout.revocable {
        let _ = write!(header, ", revocable({depth})");
    }
    b.line(header);

    b.open("template Main()");

    for input in &layout.intrinsic_inputs {
        declare_input(&mut b, input);
    }
    b.blank();
    for name in &body_limbs {
        b.line(format!("signal input {name};"));
    }
    for name in layout.fields.op_names() {
        b.line(format!("signal input {name};"));
    }
    b.blank();
    for def in &layout.public_signals {
        b.line(format!("signal output {};", def.name));
    }
    b.blank();

    // Credential digest over the body limbs, then signature, identity and
    // expiration checks in the protocol core.
    b.line(format!("component body = BodyHash({});", body_limbs.len()));
    for (i, name) in body_limbs.iter().enumerate() {
        b.line(format!("body.in[{i}] <== {name};"));
    }
    b.blank();

    let depth = layout.revocable.unwrap_or(0);
    b.line(format!("component core = CredentialCore({depth});"));
    for input in &layout.intrinsic_inputs {
        b.line(format!("core.{0} <== {0};", input.name));
    }
    b.line("core.body_hash <== body.out;");
    let n_intrinsic = layout.public_signals.len() - layout.fields.outputs().len();
    for def in &layout.public_signals[..n_intrinsic] {
        b.line(format!("{0} <== core.{0};", def.name));
    }

    for field in layout.fields.defs() {
        b.blank();
        render_field(&mut b, field);
    }

    b.close().blank().line("component main = Main();");
    b.finish()
}

fn render_field(b: &mut CodeBuilder, field: &FieldDef) {
    let n = &field.claim.name;
    b.line(format!("// {n}: {}", field.claim.tp));
    match field.claim.tp {
        ClaimType::Scalar { width: 256 } => {
            b.line(format!("component {n}_range = Uint256RangeCheck();"));
            for (i, input) in field.inputs.iter().enumerate() {
                b.line(format!("{n}_range.value[{i}] <== {input};"));
            }
            for (i, op) in field.ops.iter().enumerate() {
                b.line(format!("{n}_range.bounds[{i}] <== {op};"));
            }
            for (op, out) in field.ops.iter().zip(&field.outputs) {
                b.line(format!("{} <== {op};", out.name));
            }
        }
        ClaimType::Scalar { width } => {
            b.line(format!("component {n}_range = RangeCheck({width});"));
            b.line(format!("{n}_range.value <== {};", field.inputs[0]));
            b.line(format!("{n}_range.lb <== {};", field.ops[0]));
            b.line(format!("{n}_range.ub <== {};", field.ops[1]));
            for (op, out) in field.ops.iter().zip(&field.outputs) {
                b.line(format!("{} <== {op};", out.name));
            }
        }
        ClaimType::Property { .. } => {
            for (i, (op, out)) in field.ops.iter().zip(&field.outputs).enumerate() {
                b.line(format!("component {n}_eq{i} = IsEqual();"));
                b.line(format!("{n}_eq{i}.in[0] <== {};", field.inputs[0]));
                b.line(format!("{n}_eq{i}.in[1] <== {op};"));
                b.line(format!("{} <== {op} * 2 + {n}_eq{i}.out;", out.name));
            }
        }
        ClaimType::Boolean => {
            let input = &field.inputs[0];
            let hide = &field.ops[0];
            b.line(format!("{input} * ({input} - 1) === 0;"));
            b.line(format!("{hide} * ({hide} - 1) === 0;"));
            b.line(format!("{} <== (1 - {hide}) * ({input} * 2 + 1);", field.outputs[0].name));
        }
    }
}
