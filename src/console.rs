// Copyright 2020 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Interactive generation loop: reads a context per line, prints ranked
//! continuations. An empty line or end of input terminates the session.

use crate::common::error::RustBeamError;
use crate::generation::BeamSearchGenerator;
use crate::language_model::{LanguageModel, TokenPicker};
use std::io;
use std::io::{BufRead, Write};

/// Runs the interactive loop over arbitrary reader/writer pairs.
///
/// Results are printed one per line as
/// `<method> <probability to 3 decimals><TAB><text>`, with newlines in the
/// generated text replaced by spaces.
pub fn run<M, P, R, W>(
    generator: &BeamSearchGenerator<M, P>,
    mut reader: R,
    mut writer: W,
) -> Result<(), RustBeamError>
where
    M: LanguageModel,
    P: TokenPicker,
    R: BufRead,
    W: Write,
{
    loop {
        writer.write_all(b"\nCONTEXT:\t")?;
        writer.flush()?;
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let context = line.trim_end_matches(|character| character == '\n' || character == '\r');
        if context.is_empty() {
            break;
        }
        for output in generator.generate(context)? {
            writeln!(
                writer,
                "{} {:.3}\t{}",
                output.method,
                output.probability,
                output.text.replace('\n', " ")
            )?;
        }
    }
    Ok(())
}

/// Runs the interactive loop on stdin/stdout.
pub fn interactive<M, P>(generator: &BeamSearchGenerator<M, P>) -> Result<(), RustBeamError>
where
    M: LanguageModel,
    P: TokenPicker,
{
    let stdin = io::stdin();
    let stdout = io::stdout();
    run(generator, stdin.lock(), stdout.lock())
}
