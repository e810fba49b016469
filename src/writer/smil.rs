use crate::consts::{smil, xhtml, xml};
use crate::writer::WriterResult;
use crate::writer::xml::{XmlWriter, write_element};
use std::io::Write;

/// One `<par>` of a media overlay: a text fragment and its audio clip.
///
/// Hrefs are relative to the SMIL document.
pub(crate) struct SmilClip<'a> {
    pub(crate) text: &'a str,
    pub(crate) audio: &'a str,
    pub(crate) clip_begin: &'a str,
    pub(crate) clip_end: &'a str,
}

struct SmilWriter<'a, W> {
    textref: &'a str,
    clips: &'a [SmilClip<'a>],
    writer: XmlWriter<'a, W>,
}

impl<'a, W: Write> SmilWriter<'a, W> {
    fn write_smil(mut self) -> WriterResult<W> {
        self.writer.write_utf8_declaration()?;

        write_element! {
            writer: self.writer,
            tag: smil::SMIL,
            attributes: {
                xml::XMLNS        => smil::SMIL_NS,
                xhtml::XMLNS_EPUB => xhtml::EPUB_NS,
                smil::VERSION     => smil::SMIL_VERSION,
            }
            inner_content: {
                write_element! {
                    writer: self.writer,
                    tag: smil::BODY,
                    inner_content: {
                        self.write_seq()?;
                    }
                }?;
            }
        }?;
        Ok(self.writer.into_inner())
    }

    fn write_seq(&mut self) -> WriterResult<()> {
        let clips = self.clips;

        write_element! {
            writer: self.writer,
            tag: smil::SEQ,
            attributes: {
                xml::ID            => "seq1",
                smil::EPUB_TEXTREF => self.textref,
            }
            inner_content: {
                for (index, clip) in clips.iter().enumerate() {
                    self.write_par(index + 1, clip)?;
                }
            }
        }
    }

    fn write_par(&mut self, number: usize, clip: &SmilClip<'_>) -> WriterResult<()> {
        let id = format!("par{number}");

        write_element! {
            writer: self.writer,
            tag: smil::PAR,
            attributes: {
                xml::ID => id.as_str(),
            }
            inner_content: {
                write_element! {
                    writer: self.writer,
                    tag: smil::TEXT,
                    attributes: {
                        smil::SRC => clip.text,
                    }
                }?;
                write_element! {
                    writer: self.writer,
                    tag: smil::AUDIO,
                    attributes: {
                        smil::SRC        => clip.audio,
                        smil::CLIP_BEGIN => clip.clip_begin,
                        smil::CLIP_END   => clip.clip_end,
                    }
                }?;
            }
        }
    }
}

/// Serialize a media overlay for the content document at `textref`.
pub(crate) fn write_smil(textref: &str, clips: &[SmilClip<'_>]) -> WriterResult<Vec<u8>> {
    SmilWriter {
        textref,
        clips,
        writer: XmlWriter::new(Vec::new()),
    }
    .write_smil()
}

#[cfg(test)]
mod tests {
    use super::{SmilClip, write_smil};

    #[test]
    fn test_write_smil() {
        let clips = [
            SmilClip {
                text: "../chapter1.xhtml#p1",
                audio: "../audio/one.mp3",
                clip_begin: "0:00:00.000",
                clip_end: "0:00:05.500",
            },
            SmilClip {
                text: "../chapter1.xhtml#p2",
                audio: "../audio/one.mp3",
                clip_begin: "0:00:05.500",
                clip_end: "0:00:09.000",
            },
        ];
        let smil = String::from_utf8(write_smil("../chapter1.xhtml", &clips).unwrap()).unwrap();

        assert!(smil.contains(r#"<smil xmlns="http://www.w3.org/ns/SMIL" xmlns:epub="http://www.idpf.org/2007/ops" version="3.0">"#));
        assert!(smil.contains(r#"<seq id="seq1" epub:textref="../chapter1.xhtml">"#));
        assert!(smil.contains(r#"<par id="par2">"#));
        assert!(smil.contains(r#"<audio src="../audio/one.mp3" clipBegin="0:00:05.500" clipEnd="0:00:09.000"/>"#));
    }
}
