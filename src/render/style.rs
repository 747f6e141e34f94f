//! User-selectable visual style.

use std::fmt;

use crate::audio::SampleDomain;

/// The three live drawing styles. The idle pattern is not selectable; the
/// driver falls back to it whenever no source is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum VisualStyle {
    /// Frequency bars, left to right
    #[default]
    Bars,
    /// Rotating ring of frequency spokes
    #[value(name = "circle")]
    CircularSpectrum,
    /// Time-domain oscilloscope line
    #[value(name = "wave")]
    Waveform,
}

impl VisualStyle {
    pub const ALL: [VisualStyle; 3] = [
        VisualStyle::Bars,
        VisualStyle::CircularSpectrum,
        VisualStyle::Waveform,
    ];

    /// Sampling mode this style must be fed with
    pub fn sample_domain(self) -> SampleDomain {
        match self {
            VisualStyle::Bars | VisualStyle::CircularSpectrum => SampleDomain::Frequency,
            VisualStyle::Waveform => SampleDomain::Time,
        }
    }
}

impl fmt::Display for VisualStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VisualStyle::Bars => "bars",
            VisualStyle::CircularSpectrum => "circle",
            VisualStyle::Waveform => "wave",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn test_style_domains() {
        assert_eq!(VisualStyle::Bars.sample_domain(), SampleDomain::Frequency);
        assert_eq!(
            VisualStyle::CircularSpectrum.sample_domain(),
            SampleDomain::Frequency
        );
        assert_eq!(VisualStyle::Waveform.sample_domain(), SampleDomain::Time);
    }

    #[test]
    fn test_style_names() {
        for style in VisualStyle::ALL {
            let parsed = VisualStyle::from_str(&style.to_string(), false).unwrap();
            assert_eq!(parsed, style);
        }
        assert!(VisualStyle::from_str("spiral", false).is_err());
    }
}
