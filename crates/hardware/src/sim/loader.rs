//! Assembly loader.
//!
//! A two-pass assembler for the MIPS-like input syntax: `.data`/`.text`
//! sections, labels, the directives `.word`, `.space`, `.asciiz`, and
//! `.globl`, conventional register names, and decimal/hex immediates.
//! Pass one assigns addresses to labels; pass two builds the pre-decoded
//! instruction records and the data-segment image. The result hands the
//! core exactly what it needs: a flat byte image, an instruction array
//! indexed by `(pc - text_base) / 4`, a label table, and the entry PC
//! (the `main` label when defined, else the start of `.text`).

use std::collections::HashMap;

use crate::common::constants::{DATA_BASE, TEXT_BASE, WORD_BYTES};
use crate::common::error::AsmError;
use crate::isa::abi;
use crate::isa::{Instruction, Opcode};

/// A fully assembled program, ready to hand to the engine.
#[derive(Clone, Debug)]
pub struct LoadedProgram {
    /// Pre-decoded instructions, indexed by `(pc - text_base) / 4`.
    pub instructions: Vec<Instruction>,
    /// Address of the first instruction.
    pub text_base: u64,
    /// Entry point: `main` if defined, else `text_base`.
    pub entry: u64,
    /// Data-segment image, placed at `data_base`.
    pub data: Vec<u8>,
    /// Base address of the data segment.
    pub data_base: u64,
    /// Label → address table.
    pub labels: HashMap<String, u64>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Text,
    Data,
}

/// One source line after comment stripping and label extraction.
struct Line<'a> {
    number: usize,
    content: &'a str,
}

/// Assembles MIPS-like source text into a [`LoadedProgram`].
pub fn assemble(source: &str) -> Result<LoadedProgram, AsmError> {
    let mut labels: HashMap<String, u64> = HashMap::new();
    let mut text_lines: Vec<Line<'_>> = Vec::new();
    let mut data_len: u64 = 0;

    // Pass 1: assign label addresses, remember instruction lines.
    let mut section = Section::Text;
    let mut text_pc = TEXT_BASE;
    for (idx, raw) in source.lines().enumerate() {
        let number = idx + 1;
        let mut content = strip_comment(raw).trim();

        while let Some(colon) = label_prefix(content) {
            let (label, rest) = content.split_at(colon);
            let addr = match section {
                Section::Text => text_pc,
                Section::Data => DATA_BASE + data_len,
            };
            if labels.insert(label.trim().to_owned(), addr).is_some() {
                return Err(AsmError::Syntax {
                    line: number,
                    msg: format!("duplicate label '{}'", label.trim()),
                });
            }
            content = rest[1..].trim();
        }
        if content.is_empty() {
            continue;
        }

        if let Some(directive) = content.strip_prefix('.') {
            let (name, args) = split_once_ws(directive);
            match name {
                "text" => section = Section::Text,
                "data" => section = Section::Data,
                "globl" | "global" => {} // entry is resolved via the label table
                "word" => {
                    if section != Section::Data {
                        return Err(AsmError::Syntax {
                            line: number,
                            msg: ".word outside .data".to_owned(),
                        });
                    }
                    let count = args.split(',').filter(|s| !s.trim().is_empty()).count();
                    data_len += WORD_BYTES * count.max(1) as u64;
                }
                "space" => {
                    let n: u64 = args.trim().parse().map_err(|_| AsmError::Syntax {
                        line: number,
                        msg: format!("bad .space size '{}'", args.trim()),
                    })?;
                    data_len += n;
                }
                "asciiz" => {
                    let text = parse_string_literal(args, number)?;
                    data_len += text.len() as u64 + 1;
                }
                other => {
                    return Err(AsmError::Syntax {
                        line: number,
                        msg: format!("unknown directive '.{other}'"),
                    });
                }
            }
            continue;
        }

        match section {
            Section::Text => {
                text_lines.push(Line { number, content });
                text_pc += WORD_BYTES;
            }
            Section::Data => {
                return Err(AsmError::Syntax {
                    line: number,
                    msg: "instruction in .data section".to_owned(),
                });
            }
        }
    }

    // Pass 2: encode instructions and build the data image.
    let mut instructions = Vec::with_capacity(text_lines.len());
    for (i, line) in text_lines.iter().enumerate() {
        let pc = TEXT_BASE + i as u64 * WORD_BYTES;
        instructions.push(encode(line, pc, &labels)?);
    }

    let data = build_data_image(source, &labels, data_len)?;

    let entry = labels.get("main").copied().unwrap_or(TEXT_BASE);
    Ok(LoadedProgram {
        instructions,
        text_base: TEXT_BASE,
        entry,
        data,
        data_base: DATA_BASE,
        labels,
    })
}

/// Second walk over the source to fill the data image (label addresses are
/// known by now, so `.word some_label` resolves).
fn build_data_image(
    source: &str,
    labels: &HashMap<String, u64>,
    data_len: u64,
) -> Result<Vec<u8>, AsmError> {
    let mut image = vec![0u8; data_len as usize];
    let mut offset = 0usize;
    let mut section = Section::Text;

    for (idx, raw) in source.lines().enumerate() {
        let number = idx + 1;
        let mut content = strip_comment(raw).trim();
        while let Some(colon) = label_prefix(content) {
            content = content[colon + 1..].trim();
        }
        let Some(directive) = content.strip_prefix('.') else {
            continue;
        };
        let (name, args) = split_once_ws(directive);
        match name {
            "text" => section = Section::Text,
            "data" => section = Section::Data,
            "word" if section == Section::Data => {
                for field in args.split(',') {
                    let field = field.trim();
                    if field.is_empty() {
                        continue;
                    }
                    let value = parse_value(field, labels, number)? as u32;
                    image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
                    offset += 4;
                }
            }
            "space" if section == Section::Data => {
                let n: usize = args.trim().parse().unwrap_or(0);
                offset += n;
            }
            "asciiz" if section == Section::Data => {
                let text = parse_string_literal(args, number)?;
                image[offset..offset + text.len()].copy_from_slice(text.as_bytes());
                offset += text.len() + 1; // NUL terminator already zeroed
            }
            _ => {}
        }
    }
    Ok(image)
}

/// Builds one instruction record from a source line.
fn encode(line: &Line<'_>, pc: u64, labels: &HashMap<String, u64>) -> Result<Instruction, AsmError> {
    let number = line.number;
    let (mnemonic, rest) = split_once_ws(line.content);
    let ops: Vec<&str> = rest
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut inst = Instruction::nop(pc);

    let expect = |n: usize| -> Result<(), AsmError> {
        if ops.len() == n {
            Ok(())
        } else {
            Err(AsmError::Syntax {
                line: number,
                msg: format!("{mnemonic} expects {n} operands, got {}", ops.len()),
            })
        }
    };

    match mnemonic {
        "add" | "sub" | "mul" | "div" | "and" | "or" | "xor" | "slt" => {
            expect(3)?;
            inst.opcode = match mnemonic {
                "add" => Opcode::Add,
                "sub" => Opcode::Sub,
                "mul" => Opcode::Mul,
                "div" => Opcode::Div,
                "and" => Opcode::And,
                "or" => Opcode::Or,
                "xor" => Opcode::Xor,
                _ => Opcode::Slt,
            };
            inst.dst = Some(register(ops[0], number)?);
            inst.src1 = Some(register(ops[1], number)?);
            inst.src2 = Some(register(ops[2], number)?);
        }
        "addi" => {
            expect(3)?;
            inst.opcode = Opcode::Addi;
            inst.dst = Some(register(ops[0], number)?);
            inst.src1 = Some(register(ops[1], number)?);
            inst.imm = parse_value(ops[2], labels, number)?;
        }
        "sll" | "srl" => {
            expect(3)?;
            inst.opcode = if mnemonic == "sll" {
                Opcode::Sll
            } else {
                Opcode::Srl
            };
            inst.dst = Some(register(ops[0], number)?);
            inst.src1 = Some(register(ops[1], number)?);
            inst.imm = parse_value(ops[2], labels, number)?;
        }
        "li" => {
            expect(2)?;
            inst.opcode = Opcode::Li;
            inst.dst = Some(register(ops[0], number)?);
            inst.imm = parse_value(ops[1], labels, number)?;
        }
        "la" => {
            expect(2)?;
            inst.opcode = Opcode::La;
            inst.dst = Some(register(ops[0], number)?);
            inst.imm = parse_value(ops[1], labels, number)?;
        }
        "lw" | "sw" => {
            expect(2)?;
            let (disp, base) = mem_operand(ops[1], labels, number)?;
            inst.disp = disp;
            inst.src1 = base;
            if mnemonic == "lw" {
                inst.opcode = Opcode::Lw;
                inst.dst = Some(register(ops[0], number)?);
            } else {
                inst.opcode = Opcode::Sw;
                inst.src2 = Some(register(ops[0], number)?);
            }
        }
        "beq" | "bne" | "bgt" | "bge" | "ble" | "blt" => {
            expect(3)?;
            inst.opcode = match mnemonic {
                "beq" => Opcode::Beq,
                "bne" => Opcode::Bne,
                "bgt" => Opcode::Bgt,
                "bge" => Opcode::Bge,
                "ble" => Opcode::Ble,
                _ => Opcode::Blt,
            };
            inst.src1 = Some(register(ops[0], number)?);
            inst.src2 = Some(register(ops[1], number)?);
            inst.target = Some(target(ops[2], labels, number)?);
        }
        "j" | "jal" => {
            expect(1)?;
            inst.opcode = if mnemonic == "j" { Opcode::J } else { Opcode::Jal };
            inst.target = Some(target(ops[0], labels, number)?);
            if mnemonic == "jal" {
                inst.dst = Some(abi::REG_RA);
            }
        }
        "jr" => {
            expect(1)?;
            inst.opcode = Opcode::Jr;
            inst.src1 = Some(register(ops[0], number)?);
        }
        "nop" => {
            expect(0)?;
        }
        "syscall" => {
            expect(0)?;
            inst.opcode = Opcode::Syscall;
            inst.src1 = Some(abi::REG_V0);
        }
        other => {
            return Err(AsmError::UnknownOpcode {
                line: number,
                op: other.to_owned(),
            });
        }
    }
    Ok(inst)
}

fn register(token: &str, line: usize) -> Result<usize, AsmError> {
    abi::parse_register(token).ok_or_else(|| AsmError::UnknownRegister {
        line,
        name: token.to_owned(),
    })
}

/// Parses `disp($base)`, a bare label, or a bare address.
fn mem_operand(
    token: &str,
    labels: &HashMap<String, u64>,
    line: usize,
) -> Result<(i32, Option<usize>), AsmError> {
    if let Some(open) = token.find('(') {
        let close = token.rfind(')').ok_or_else(|| AsmError::MalformedOperand {
            line,
            text: token.to_owned(),
        })?;
        let disp_text = token[..open].trim();
        let disp = if disp_text.is_empty() {
            0
        } else {
            parse_value(disp_text, labels, line)? as i32
        };
        let base = register(token[open + 1..close].trim(), line)?;
        Ok((disp, Some(base)))
    } else {
        // Absolute form: the resolved label/address is the displacement.
        let addr = parse_value(token, labels, line)?;
        Ok((addr as i32, None))
    }
}

/// Parses a branch/jump target: a label or an absolute address.
fn target(token: &str, labels: &HashMap<String, u64>, line: usize) -> Result<u64, AsmError> {
    parse_value(token, labels, line).map(|v| v as u64)
}

/// Parses an immediate (decimal, `0x` hex, negative) or a defined label.
fn parse_value(token: &str, labels: &HashMap<String, u64>, line: usize) -> Result<i64, AsmError> {
    let token = token.trim();
    if let Some(addr) = labels.get(token) {
        return Ok(*addr as i64);
    }
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()
    } else {
        digits.parse::<i64>().ok()
    };
    match parsed {
        Some(v) => Ok(if negative { -v } else { v }),
        None if token.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') => {
            Err(AsmError::UnresolvedLabel {
                line,
                label: token.to_owned(),
            })
        }
        None => Err(AsmError::MalformedOperand {
            line,
            text: token.to_owned(),
        }),
    }
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or("")
}

/// Byte offset of a leading `label:` colon, if the line starts with one.
fn label_prefix(content: &str) -> Option<usize> {
    let colon = content.find(':')?;
    let candidate = &content[..colon];
    let valid = !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    valid.then_some(colon)
}

fn split_once_ws(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((head, tail)) => (head.trim(), tail.trim()),
        None => (text.trim(), ""),
    }
}

fn parse_string_literal(args: &str, line: usize) -> Result<String, AsmError> {
    let args = args.trim();
    let inner = args
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| AsmError::Syntax {
            line,
            msg: format!("expected quoted string, got '{args}'"),
        })?;
    Ok(inner.replace("\\n", "\n").replace("\\t", "\t"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_program() {
        let program = assemble(
            "main:\n  li $t0, 1\n  addi $t1, $t0, 2\n  syscall\n",
        )
        .unwrap();
        assert_eq!(program.instructions.len(), 3);
        assert_eq!(program.entry, TEXT_BASE);
        assert_eq!(program.instructions[0].opcode, Opcode::Li);
        assert_eq!(program.instructions[1].src1, Some(8));
        assert_eq!(program.instructions[2].src1, Some(abi::REG_V0));
    }

    #[test]
    fn test_branch_target_resolution() {
        let program = assemble(
            "main:\n  beq $t0, $t1, done\n  nop\ndone:\n  nop\n",
        )
        .unwrap();
        assert_eq!(
            program.instructions[0].target,
            Some(TEXT_BASE + 2 * WORD_BYTES)
        );
    }

    #[test]
    fn test_data_directives() {
        let program = assemble(
            ".data\nvec:  .word 1, 2, 3\npad:  .space 8\nmsg:  .asciiz \"hi\"\n.text\nmain: nop\n",
        )
        .unwrap();
        assert_eq!(program.labels["vec"], DATA_BASE);
        assert_eq!(program.labels["pad"], DATA_BASE + 12);
        assert_eq!(program.labels["msg"], DATA_BASE + 20);
        assert_eq!(program.data.len(), 23);
        assert_eq!(&program.data[0..4], &1u32.to_le_bytes());
        assert_eq!(&program.data[8..12], &3u32.to_le_bytes());
        assert_eq!(&program.data[20..23], b"hi\0");
    }

    #[test]
    fn test_la_resolves_data_label() {
        let program = assemble(".data\nx: .word 7\n.text\nmain:\n  la $a0, x\n").unwrap();
        assert_eq!(program.instructions[0].imm, DATA_BASE as i64);
    }

    #[test]
    fn test_mem_operand_forms() {
        let program = assemble(
            ".data\nx: .word 7\n.text\nmain:\n  lw $t0, 4($sp)\n  lw $t1, x\n  sw $t2, -8($sp)\n",
        )
        .unwrap();
        let lw = program.instructions[0];
        assert_eq!(lw.disp, 4);
        assert_eq!(lw.src1, Some(abi::REG_SP));

        let lw_abs = program.instructions[1];
        assert_eq!(lw_abs.disp, DATA_BASE as i32);
        assert_eq!(lw_abs.src1, None);

        let sw = program.instructions[2];
        assert_eq!(sw.disp, -8);
        assert_eq!(sw.src2, Some(10));
    }

    #[test]
    fn test_entry_is_main() {
        let program = assemble("nop\nmain:\n  nop\n").unwrap();
        assert_eq!(program.entry, TEXT_BASE + WORD_BYTES);
    }

    #[test]
    fn test_unknown_opcode() {
        let err = assemble("main:\n  frobnicate $t0\n").unwrap_err();
        assert!(matches!(err, AsmError::UnknownOpcode { line: 2, .. }));
    }

    #[test]
    fn test_unresolved_label() {
        let err = assemble("main:\n  j nowhere\n").unwrap_err();
        assert!(matches!(err, AsmError::UnresolvedLabel { .. }));
    }

    #[test]
    fn test_unknown_register() {
        let err = assemble("main:\n  add $t0, $bogus, $t1\n").unwrap_err();
        assert!(matches!(err, AsmError::UnknownRegister { .. }));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let err = assemble("x:\n  nop\nx:\n  nop\n").unwrap_err();
        assert!(matches!(err, AsmError::Syntax { .. }));
    }

    #[test]
    fn test_hex_and_negative_immediates() {
        let program = assemble("main:\n  li $t0, 0x10\n  li $t1, -5\n").unwrap();
        assert_eq!(program.instructions[0].imm, 16);
        assert_eq!(program.instructions[1].imm, -5);
    }
}
