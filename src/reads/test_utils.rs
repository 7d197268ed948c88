use super::AlignedRead;
use rust_htslib::bam::{
    self,
    record::{Aux, CigarString},
};

/// Builds reads through a real HTSlib record so tests exercise `from_hts_rec`.
pub struct ReadBuilder {
    contig: String,
    pos: i64,
    cigar: CigarString,
    name: String,
    bases: Option<Vec<u8>>,
    quals: Option<Vec<u8>>,
    mapq: u8,
    flags: u16,
    mate_seq: Option<String>,
}

impl ReadBuilder {
    pub fn new(contig: &str, pos: i64, cigar: &str) -> Self {
        Self {
            contig: contig.to_string(),
            pos,
            cigar: CigarString::try_from(cigar).unwrap(),
            name: "test_read".to_string(),
            bases: None,
            quals: None,
            mapq: 60,
            flags: 0,
            mate_seq: None,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn bases(mut self, bases: &str) -> Self {
        self.bases = Some(bases.as_bytes().to_vec());
        self
    }

    pub fn quals(mut self, quals: &[u8]) -> Self {
        self.quals = Some(quals.to_vec());
        self
    }

    pub fn mapq(mut self, mapq: u8) -> Self {
        self.mapq = mapq;
        self
    }

    pub fn reverse(mut self) -> Self {
        self.flags |= 0x10;
        self
    }

    /// Sets additional SAM flag bits, e.g. 0x400 for a duplicate.
    pub fn flag(mut self, flag: u16) -> Self {
        self.flags |= flag;
        self
    }

    /// Marks the mate as unmapped and attaches its sequence in the MT tag.
    pub fn unmapped_mate(mut self, mate_seq: &str) -> Self {
        self.flags |= 0x1 | 0x8;
        self.mate_seq = Some(mate_seq.to_string());
        self
    }

    pub fn query_len(&self) -> usize {
        self.cigar
            .iter()
            .map(|op| match op {
                bam::record::Cigar::Match(l)
                | bam::record::Cigar::Ins(l)
                | bam::record::Cigar::SoftClip(l)
                | bam::record::Cigar::Equal(l)
                | bam::record::Cigar::Diff(l) => *l as usize,
                _ => 0,
            })
            .sum()
    }

    pub fn record(&self) -> bam::Record {
        let len = self.query_len();
        let bases = self
            .bases
            .clone()
            .unwrap_or_else(|| b"ACGT".iter().cycle().take(len).copied().collect());
        assert_eq!(bases.len(), len, "bases do not match the CIGAR query length");
        let quals = self.quals.clone().unwrap_or_else(|| vec![30; len]);

        let mut rec = bam::Record::new();
        rec.set(self.name.as_bytes(), Some(&self.cigar), &bases, &quals);
        rec.set_tid(0);
        rec.set_pos(self.pos);
        rec.set_mapq(self.mapq);
        rec.set_flags(self.flags);
        if let Some(mate_seq) = &self.mate_seq {
            rec.set_mtid(0);
            rec.set_mpos(self.pos);
            rec.push_aux(b"MT", Aux::String(mate_seq)).unwrap();
        } else {
            rec.set_mtid(-1);
            rec.set_mpos(-1);
        }
        rec
    }

    pub fn build(self) -> AlignedRead {
        AlignedRead::from_hts_rec(&self.record(), &self.contig)
    }
}
