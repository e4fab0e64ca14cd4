//! IEEE 488.2 common commands.

pub enum Query {
    ///Identification query
    IDN,
    ///Self-test query
    TST,
    ///Operation complete query
    OPC,
    ///Event status enable query
    ESE,
    ///Event status register query
    ESR,
    ///Service request enable query
    SRE,
    ///Read status byte query
    STB,
}

impl Query {
    pub fn as_str(&self) -> &'static str {
        match self {
            Query::IDN => "*IDN?",
            Query::TST => "*TST?",
            Query::OPC => "*OPC?",
            Query::ESE => "*ESE?",
            Query::ESR => "*ESR?",
            Query::SRE => "*SRE?",
            Query::STB => "*STB?",
        }
    }
}

pub enum Command {
    ///Reset
    RST,
    ///Operation complete
    OPC,
    ///Wait to complete
    WAI,
    ///Clear status
    CLS,
    ///Event status enable
    ESE,
    ///Service request enable
    SRE,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::RST => "*RST",
            Command::OPC => "*OPC",
            Command::WAI => "*WAI",
            Command::CLS => "*CLS",
            Command::ESE => "*ESE",
            Command::SRE => "*SRE",
        }
    }
}

impl From<Query> for super::Command {
    fn from(q: Query) -> Self {
        super::Command::new(q.as_str())
    }
}

impl From<Command> for super::Command {
    fn from(c: Command) -> Self {
        super::Command::new(c.as_str())
    }
}
