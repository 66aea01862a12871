//! Project information from a POM

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::warn;

const URL_ELEMENT: &[u8] = b"url";

/// Text of the first `<url>` element of a POM, in document order.
///
/// Usually the project url; a nested `<url>` such as the one under `<scm>`
/// wins when it comes first. `None` when that element is empty or the
/// document cannot be read up to it.
pub fn project_url(document: &str) -> Option<String> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut in_url = false;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == URL_ELEMENT => {
                in_url = true;
                text.clear();
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == URL_ELEMENT => return None,
            Ok(Event::Text(ref e)) if in_url => match e.unescape() {
                Ok(unescaped) => text.push_str(&unescaped),
                Err(e) => {
                    warn!("cannot read <url> of POM: {}", e);
                    return None;
                }
            },
            Ok(Event::CData(ref e)) if in_url => {
                text.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::End(ref e)) if in_url && e.local_name().as_ref() == URL_ELEMENT => {
                let url = text.trim();
                return (!url.is_empty()).then(|| url.to_string());
            }
            Ok(Event::Eof) => return None,
            Err(e) => {
                warn!("cannot handle POM: {}", e);
                return None;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_url_reads_first_url_element() {
        let pom = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>mysql</groupId>
  <artifactId>mysql-connector-java</artifactId>
  <version>5.1.14</version>
  <url>http://dev.mysql.com/doc/connector-j/en/</url>
  <scm>
    <url>http://github.com/mysql/mysql-connector-j</url>
  </scm>
</project>"#;

        assert_eq!(
            project_url(pom).as_deref(),
            Some("http://dev.mysql.com/doc/connector-j/en/")
        );
    }

    #[test]
    fn project_url_unescapes_entities() {
        let pom = "<project><url>https://ci.example/job?a=1&amp;b=2</url></project>";

        assert_eq!(
            project_url(pom).as_deref(),
            Some("https://ci.example/job?a=1&b=2")
        );
    }

    #[test]
    fn project_url_is_absent_without_url_element() {
        assert_eq!(project_url("<project><name>app</name></project>"), None);
        assert_eq!(project_url("<project><url/></project>"), None);
    }

    #[test]
    fn project_url_is_absent_for_non_xml() {
        assert_eq!(project_url("<html><body>Not Found</body>"), None);
        assert_eq!(project_url("404 Not Found"), None);
    }
}
