//! CSV answer sheets in, stored results out.

use std::io::{Read, Write};

use crate::answer::{Answer, Session, Submission};
use crate::error::{Error, ValidationError};
use crate::question::QuestionBank;
use crate::role::Role;
use crate::store::StoredResult;

/// Reads answer sheets, one respondent per row after a header row.
///
/// The first column is the username, then one column per question in bank order.
/// Single choice cells hold an option key, point allocation cells hold pairs such as
/// `a=2;c=5;g=3`. Blank cells are unanswered. Every row is validated like an
/// interactive session, and a bad row does not stop the rows after it.
pub fn read_bulk<'a, R: Read + 'a>(
    reader: R,
    bank: &'a QuestionBank,
) -> impl Iterator<Item = Result<Submission, Error>> + 'a {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
        .into_records()
        .map(move |record| -> Result<Submission, Error> {
            let record = record?;
            let username = record.get(0).unwrap_or_default();
            let mut session = Session::new(bank, username)?;
            for (index, cell) in record.iter().skip(1).enumerate() {
                if cell.is_empty() {
                    continue;
                }
                let question = bank
                    .get(index)
                    .ok_or(ValidationError::UnknownQuestion(index))?;
                session.answer(index, Answer::parse(question.kind, cell)?)?;
            }
            Ok(session.finish())
        })
}

/// Writes results as CSV with one score column per role.
pub fn export_csv<W: Write>(results: &[StoredResult], writer: W) -> Result<(), Error> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec!["id", "username", "timestamp"];
    header.extend(Role::ALL.iter().map(Role::id));
    header.extend(["primary_role", "secondary_role"]);
    writer.write_record(&header)?;

    for result in results {
        let mut record = vec![
            result.id.to_string(),
            result.username.clone(),
            result.timestamp.to_rfc3339(),
        ];
        record.extend(result.scores.iter().map(|(_, score)| score.to_string()));
        record.push(result.primary_role.map(|role| role.id()).unwrap_or_default().to_string());
        record.push(result.secondary_role.map(|role| role.id()).unwrap_or_default().to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
