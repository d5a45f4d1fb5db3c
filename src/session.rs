// 🖥️ Interactive Session - Numbered menu over any reader/writer
//
// 1: import file, 2: add manually, 3: remove by id, 4: display all, 5: exit
//
// Manual entry re-asks only the field that failed. End of input at any
// prompt ends the session without a partial insert.

use crate::entities::{Patron, PatronRegistry};
use crate::error::{RegistryError, Result};
use crate::importer::PatronImporter;
use crate::validation::{valid_address, valid_name, FineCheck};
use std::io::{BufRead, Write};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ImportFile,
    AddManually,
    Remove,
    DisplayAll,
    Exit,
}

impl MenuChoice {
    pub fn from_number(n: i64) -> Option<Self> {
        match n {
            1 => Some(MenuChoice::ImportFile),
            2 => Some(MenuChoice::AddManually),
            3 => Some(MenuChoice::Remove),
            4 => Some(MenuChoice::DisplayAll),
            5 => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

pub struct Session<R, W> {
    registry: PatronRegistry,
    importer: PatronImporter,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(importer: PatronImporter, input: R, output: W) -> Self {
        Self::with_registry(PatronRegistry::new(), importer, input, output)
    }

    pub fn with_registry(
        registry: PatronRegistry,
        importer: PatronImporter,
        input: R,
        output: W,
    ) -> Self {
        Session {
            registry,
            importer,
            input,
            output,
        }
    }

    pub fn registry(&self) -> &PatronRegistry {
        &self.registry
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_registry(self) -> PatronRegistry {
        self.registry
    }

    /// Run the menu until the user picks Exit or input ends.
    pub fn run(&mut self) -> Result<()> {
        info!("interactive session started");

        loop {
            let choice = match self.menu_round() {
                Err(RegistryError::InputClosed) => {
                    debug!("input closed, ending session");
                    return Ok(());
                }
                other => other?,
            };

            if choice == Some(MenuChoice::Exit) {
                info!(patrons = self.registry.len(), "interactive session ended");
                return Ok(());
            }
        }
    }

    fn menu_round(&mut self) -> Result<Option<MenuChoice>> {
        writeln!(self.output)?;
        writeln!(self.output, "===== Library Management System =====")?;
        writeln!(self.output, "1. Load patrons from file")?;
        writeln!(self.output, "2. Add patron manually")?;
        writeln!(self.output, "3. Remove patron by ID")?;
        writeln!(self.output, "4. Display all patrons")?;
        writeln!(self.output, "5. Exit")?;

        let number = self.read_choice()?;
        let choice = MenuChoice::from_number(number);

        match choice {
            Some(MenuChoice::ImportFile) => {
                let filename = self.prompt("Enter file name (e.g., patrons.txt): ")?;
                self.import_file(&filename)?;
            }
            Some(MenuChoice::AddManually) => self.add_manually()?,
            Some(MenuChoice::Remove) => {
                let id = self.prompt("Enter Patron ID to remove: ")?;
                self.remove(&id)?;
            }
            Some(MenuChoice::DisplayAll) => self.display_all()?,
            Some(MenuChoice::Exit) => {
                writeln!(self.output, "Exiting Library Management System. Goodbye!")?;
            }
            None => writeln!(self.output, "Invalid choice. Select 1-5.")?,
        }

        Ok(choice)
    }

    /// Re-prompt until the input is an integer. Range is checked by the caller.
    fn read_choice(&mut self) -> Result<i64> {
        loop {
            let line = self.prompt("Enter your choice: ")?;
            match line.parse::<i64>() {
                Ok(n) => return Ok(n),
                Err(_) => {
                    writeln!(self.output, "Invalid input. Enter a number between 1 and 5.")?
                }
            }
        }
    }

    /// Import a file and print every diagnostic.
    pub fn import_file(&mut self, filename: &str) -> Result<()> {
        let report = self.importer.import_file(filename, &mut self.registry);
        for message in report.messages() {
            writeln!(self.output, "{}", message)?;
        }
        Ok(())
    }

    /// Prompt field by field, re-asking only the field that failed.
    pub fn add_manually(&mut self) -> Result<()> {
        let rules = self.importer.rules().clone();

        let id = loop {
            let id = self.prompt(&format!("Enter {}-digit ID: ", rules.id_length))?;
            if !rules.valid_id(&id) {
                writeln!(
                    self.output,
                    "Invalid ID. Must be exactly {} digits.",
                    rules.id_length
                )?;
            } else if self.registry.contains(&id) {
                writeln!(
                    self.output,
                    "Duplicate ID. A patron with this ID already exists."
                )?;
            } else {
                break id;
            }
        };

        let name = loop {
            let name = self.prompt("Enter Name: ")?;
            if valid_name(&name) {
                break name;
            }
            writeln!(self.output, "Invalid name. Name cannot be empty.")?;
        };

        let address = loop {
            let address = self.prompt("Enter Address: ")?;
            if valid_address(&address) {
                break address;
            }
            writeln!(self.output, "Invalid address. Address cannot be empty.")?;
        };

        let fine = loop {
            let text = self.prompt(&format!(
                "Enter Fine ({}-{}): ",
                rules.fine_min, rules.fine_max
            ))?;
            match rules.check_fine(&text) {
                FineCheck::Valid(v) => break v,
                FineCheck::OutOfRange(_) => writeln!(
                    self.output,
                    "Fine must be between {} and {}.",
                    rules.fine_min, rules.fine_max
                )?,
                FineCheck::Unparsable => {
                    writeln!(self.output, "Invalid fine. Please enter a numeric value.")?
                }
            }
        };

        let patron = Patron::new(&id, &name, &address, fine, &rules)?;
        self.registry.insert(patron)?;
        writeln!(self.output, "Patron added successfully.")?;
        Ok(())
    }

    /// Returns whether a patron was removed.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let removed = self.registry.remove(id).is_some();
        if removed {
            writeln!(self.output, "Patron {} removed successfully.", id)?;
        } else {
            writeln!(self.output, "No patron found with ID {}", id)?;
        }
        Ok(removed)
    }

    pub fn display_all(&mut self) -> Result<()> {
        if self.registry.is_empty() {
            writeln!(self.output, "No patrons in the system.")?;
            return Ok(());
        }

        for patron in self.registry.all() {
            writeln!(self.output, "{}", patron)?;
        }
        Ok(())
    }

    fn prompt(&mut self, text: &str) -> Result<String> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        self.read_line()
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(RegistryError::InputClosed);
        }
        Ok(line.trim().to_string())
    }
}
