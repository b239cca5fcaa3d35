use std::fmt::Debug;

use phonenumber::country;

#[derive(Debug, Clone)]
pub struct PhoneNumberDomain(pub String);

impl PhoneNumberDomain{
    // Numbers without an international prefix are read as French numbers
    pub fn parse(number: String) -> Result<PhoneNumberDomain, String>{
        let number = number.trim().to_string();
        match phonenumber::parse(Some(country::FR), &number) {
            Ok(parsed) if phonenumber::is_valid(&parsed) => Ok(Self(number)),
            _ => Err(format!("{} is not a valid phone number", number))
        }
    }

    pub fn inner(&self) -> String {
        self.0.clone()
    }
}

impl std::fmt::Display for PhoneNumberDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}
