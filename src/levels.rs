use std::fs;
use std::path::Path;

use crate::board::Board;
use crate::error::LevelError;

/// A collection of levels in XSB format.
#[derive(Debug)]
pub struct Levels {
    levels: Vec<Board>,
}

impl Levels {
    /// Parse XSB-formatted levels from a string.
    ///
    /// The XSB format uses:
    /// - Lines starting with `;` as level separators/comments
    /// - Standard Sokoban characters (#, @, $, ., *, +, space)
    /// - Empty lines between levels (optional)
    ///
    /// Rows of different lengths are padded with empty cells.
    pub fn from_text(contents: &str) -> Result<Self, LevelError> {
        let mut levels = Vec::new();
        let mut current = String::new();

        for line in contents.lines() {
            let separator = line.trim_start().starts_with(';') || line.trim().is_empty();
            if separator {
                flush(&mut current, &mut levels)?;
                continue;
            }
            current.push_str(line);
            current.push('\n');
        }
        // The last level may not be followed by a separator
        flush(&mut current, &mut levels)?;

        Ok(Levels { levels })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LevelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    /// Get the nth level (0-indexed).
    pub fn get(&self, index: usize) -> Option<&Board> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

fn flush(current: &mut String, levels: &mut Vec<Board>) -> Result<(), LevelError> {
    if current.is_empty() {
        return Ok(());
    }
    let board = Board::from_text(current.trim_end_matches('\n')).map_err(|source| {
        LevelError::Map {
            index: levels.len(),
            source,
        }
    })?;
    levels.push(board);
    current.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;

    #[test]
    fn test_from_text_basic() {
        let level1 = "####
# .#
#  ###
#*@  #
#  $ #
#  ###
####";

        let level2 = "######
#    #
# #@ #
# $* #
# .* #
#    #
######";

        let level3 = "  ####
###  ####
#     $ #
# #  #$ #
# . .#@ #
#########";

        let xsb_content = format!(
            "; 1\n\n{}\n\n; 2\n\n{}\n\n; 3\n\n{}\n",
            level1, level2, level3
        );

        let levels = Levels::from_text(&xsb_content).unwrap();

        assert_eq!(levels.len(), 3);
        assert_eq!(levels.get(0).unwrap().to_string().trim_end(), level1);
        assert_eq!(levels.get(1).unwrap().to_string().trim_end(), level2);
        assert_eq!(levels.get(2).unwrap().to_string().trim_end(), level3);
        assert!(levels.get(3).is_none());
    }

    #[test]
    fn test_levels_without_separators_at_end() {
        let levels = Levels::from_text("#####\n#@$.#\n#####").unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels.get(0).unwrap().boxes().len(), 1);
    }

    #[test]
    fn test_from_text_invalid_level() {
        let xsb_content = "; 1

#####
#@$.#
#####

; 2

####
# .#
#@@  #
####
";

        let result = Levels::from_text(xsb_content);
        assert!(matches!(
            result.unwrap_err(),
            LevelError::Map {
                index: 1,
                source: MapError::MultiplePlayers { x: 2, y: 2 }
            }
        ));
    }

    #[test]
    fn test_comments_only() {
        let levels = Levels::from_text("; nothing here\n\n; still nothing\n").unwrap();
        assert!(levels.is_empty());
    }

    #[test]
    fn test_from_file_no_file() {
        let result = Levels::from_file("nonexistent_file.xsb");
        assert!(matches!(result.unwrap_err(), LevelError::Io(_)));
    }
}
